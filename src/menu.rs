// menu.rs — In-game mod menu: the feature list it shows and the change callback.
//
// The host menu takes a flat list of strings, one per row:
//
//   Category_<title>                  section header
//   <id>_SeekBar_<label>_<min>_<max>  slider reporting `id`
//   <id>_Toggle_<label>               switch reporting `id`
//   RichTextView_<html>               static hint text
//
// and calls back with the row id whenever the player changes something.
// This callback is the only writer of the per-entity toggles.

use crate::config::OverlayConfig;
use crate::entities::TrackedEntity;
use crate::state::SharedState;
use std::fmt;
use tracing::{info, warn};

/// Top of the game speed slider. 10 is normal speed.
pub const SPEED_MAX: i32 = 50;

/// One row of the mod menu.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feature {
    Category(String),
    SeekBar { id: i32, label: String, min: i32, max: i32 },
    Toggle { id: i32, label: String },
    RichText(String),
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Category(title) => write!(f, "Category_{title}"),
            Feature::SeekBar { id, label, min, max } => write!(f, "{id}_SeekBar_{label}_{min}_{max}"),
            Feature::Toggle { id, label } => write!(f, "{id}_Toggle_{label}"),
            Feature::RichText(html) => write!(f, "RichTextView_{html}"),
        }
    }
}

/// One callback from the menu. Which value field matters depends on the
/// control: seek bars fill `int_value`, toggles fill `bool_value`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MenuChange {
    pub feature: i32,
    pub name: String,
    pub int_value: i32,
    pub long_value: i64,
    pub bool_value: bool,
    pub text: Option<String>,
}

/// What a feature id does when the menu reports a change for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    TimeScale,
    Toggle(usize),
    Ignored,
}

pub struct Menu {
    features: Vec<Feature>,
    time_scale_feature: i32,
    /// (feature id, entity index, menu label)
    toggles: Vec<(i32, usize, String)>,
}

impl Menu {
    pub fn new(config: &OverlayConfig) -> Self {
        Self::build(config.time_scale_feature, &config.entities)
    }

    fn build(time_scale_feature: i32, entities: &[TrackedEntity]) -> Self {
        let mut features = vec![
            Feature::Category("Speed Hack".into()),
            Feature::SeekBar {
                id: time_scale_feature,
                label: "Game Speed (10 = Normal)".into(),
                min: 0,
                max: SPEED_MAX,
            },
            Feature::RichText("<small>Use 0 to pause the game and 10 for normal speed.</small>".into()),
            Feature::Category("ESP (Extra Sensory Perception)".into()),
        ];

        let mut toggles = Vec::with_capacity(entities.len());
        for (index, entity) in entities.iter().enumerate() {
            if entity.feature_id == time_scale_feature || toggles.iter().any(|(id, _, _)| *id == entity.feature_id) {
                warn!("feature id {} for {} is already taken, toggle not added", entity.feature_id, entity.label);
                continue;
            }
            features.push(Feature::Toggle { id: entity.feature_id, label: entity.menu_label.clone() });
            toggles.push((entity.feature_id, index, entity.menu_label.clone()));
        }

        Self { features, time_scale_feature, toggles }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// The feature list as the menu strings the host expects.
    pub fn encoded(&self) -> Vec<String> {
        self.features.iter().map(ToString::to_string).collect()
    }

    pub fn action(&self, feature: i32) -> Action {
        if feature == self.time_scale_feature {
            return Action::TimeScale;
        }
        self.toggles
            .iter()
            .find(|(id, _, _)| *id == feature)
            .map_or(Action::Ignored, |&(_, index, _)| Action::Toggle(index))
    }

    /// Handle one menu change. Returns what was done with it.
    pub fn apply(&self, state: &SharedState, change: &MenuChange) -> Action {
        let action = self.action(change.feature);
        match action {
            Action::TimeScale => {
                let scale = change.int_value as f32 / 10.0;
                match state.functions().and_then(|f| f.time_scale_fn()) {
                    Some(set_time_scale) => {
                        unsafe { set_time_scale(scale) };
                        info!("time scale set to {scale}");
                    }
                    None => warn!("set_timeScale not resolved, ignoring speed {}", change.int_value),
                }
            }
            Action::Toggle(index) => {
                if let Some(slot) = state.slot(index) {
                    slot.set_enabled(change.bool_value);
                    let label = self.toggles.iter().find(|t| t.1 == index).map_or("", |t| t.2.as_str());
                    info!("{label} {}", if change.bool_value { "enabled" } else { "disabled" });
                }
            }
            Action::Ignored => {}
        }
        action
    }
}
