// config.rs — Offsets, targets and timings, optionally overridden from a TOML file.
//
// Game updates shift RVAs and field offsets, so everything that came out of
// the IL2CPP dump lives here rather than in code. The file is located through
// GRANNY_OVERLAY_CONFIG; without it the built-in defaults are used.
//
// Example:
//
//   module = "libil2cpp.so"
//   frame_rate = 60
//
//   [offsets]
//   set_time_scale = "0x2A2CF38"
//
//   [[entities]]
//   label = "Last Sighting"
//   menu_label = "Player Position"
//   feature_id = 4
//   instance = "0x87654321"
//   color = "0xFF0000FF"
//   style = "crosshair"
//   position = { kind = "direct", offset = "0x20" }

use crate::entities::TrackedEntity;
use crate::error::{OverlayError, Result};
use crate::resolver::parse_offset;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "GRANNY_OVERLAY_CONFIG";

/// RVAs of the game functions, relative to the module base.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FunctionOffsets {
    /// `UnityEngine.Time.set_timeScale(float)`
    #[serde(deserialize_with = "hex_usize")]
    pub set_time_scale: usize,
    /// `UnityEngine.Camera.get_main()`
    #[serde(deserialize_with = "hex_usize")]
    pub camera_get_main: usize,
    /// `UnityEngine.Camera.get_projectionMatrix_Injected(Camera, out Matrix4x4)`
    #[serde(deserialize_with = "hex_usize")]
    pub camera_get_projection_matrix: usize,
}

impl Default for FunctionOffsets {
    fn default() -> Self {
        Self {
            set_time_scale: 0x2A2_CF38,
            camera_get_main: 0x29F_4C2C,
            camera_get_projection_matrix: 0x29F_4504,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Library the offsets are relative to.
    pub module: String,
    /// How often the installer checks whether the module is loaded.
    pub poll_interval_ms: u64,
    /// Overlay iterations per second.
    pub frame_rate: u32,
    /// Menu feature number of the game speed seek bar.
    pub time_scale_feature: i32,
    pub offsets: FunctionOffsets,
    pub entities: Vec<TrackedEntity>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            module: "libil2cpp.so".into(),
            poll_interval_ms: 1000,
            frame_rate: 60,
            time_scale_feature: 0,
            offsets: FunctionOffsets::default(),
            entities: TrackedEntity::defaults(),
        }
    }
}

impl OverlayConfig {
    /// Config from the file named by `GRANNY_OVERLAY_CONFIG`, or the defaults.
    pub fn from_env() -> Self {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load_or_default(Path::new(&path)),
            None => {
                info!("[CONFIG] {} not set, using built-in offsets", CONFIG_ENV);
                Self::default()
            }
        }
    }

    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text).map_err(|source| OverlayError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Like `load`, but any problem falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            warn!("[CONFIG] {} does not exist, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("[CONFIG] loaded {} ({} targets)", path.display(), config.entities.len());
                config
            }
            Err(e) => {
                warn!("[CONFIG] {e}, using defaults");
                Self::default()
            }
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Sleep between overlay iterations (1/60 s at the default rate).
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.frame_rate.max(1)))
    }
}

/// Accepts either an integer or an offset string such as `"0x28"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum HexValue {
    Int(u64),
    Text(String),
}

impl HexValue {
    fn into_u64(self) -> Result<u64> {
        match self {
            HexValue::Int(v) => Ok(v),
            HexValue::Text(s) => parse_offset(&s).map(|v| v as u64),
        }
    }
}

pub(crate) fn hex_usize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<usize, D::Error> {
    let v = HexValue::deserialize(d)?.into_u64().map_err(D::Error::custom)?;
    usize::try_from(v).map_err(D::Error::custom)
}

pub(crate) fn hex_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<u32, D::Error> {
    let v = HexValue::deserialize(d)?.into_u64().map_err(D::Error::custom)?;
    u32::try_from(v).map_err(D::Error::custom)
}
