// entities.rs — Overlay targets and reading their world positions out of game memory.
//
// Game objects are IL2CPP instances whose layout is only known through
// offsets from a dump. Instead of mirroring those layouts as Rust structs,
// each target carries a `PositionSource` describing where its position
// lives, and `FieldPositionReader` interprets it against a `MemoryReader`.
// Offsets therefore come from the config file and can change without a rebuild.

use crate::canvas::Argb;
use crate::config::{hex_u32, hex_usize};
use crate::math::Vec3;
use crate::memory::MemoryReader;
use serde::Deserialize;

/// Where an object's world position is stored.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionSource {
    /// A Vector3 stored inline at `offset` (e.g. `LastPlayerSighting.position` at 0x20).
    Direct {
        #[serde(deserialize_with = "hex_usize")]
        offset: usize,
    },
    /// A reference at `reference_offset` to a Transform whose position
    /// accessor yields the real value (e.g. `EnemyAIGranny.myTransform` at 0x28).
    ///
    /// The accessor's calling contract is unknown, so this is not followed:
    /// reads return `fallback` unchanged.
    Indirect {
        #[serde(deserialize_with = "hex_usize")]
        reference_offset: usize,
        fallback: [f32; 3],
    },
}

/// How a visible target is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawStyle {
    /// 50x100 box standing on the projected point, label above.
    Box,
    /// Small cross centred on the projected point, label below.
    Crosshair,
}

/// One overlay target.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrackedEntity {
    /// Text drawn next to the target.
    pub label: String,
    /// Text of the menu toggle controlling this target.
    pub menu_label: String,
    /// Feature number the menu reports for that toggle.
    pub feature_id: i32,
    /// Placeholder instance address used until discovery reports a real one.
    #[serde(default, deserialize_with = "hex_usize")]
    pub instance: usize,
    #[serde(deserialize_with = "hex_u32")]
    pub color: Argb,
    pub style: DrawStyle,
    pub position: PositionSource,
}

impl TrackedEntity {
    /// The two targets this overlay ships with.
    pub fn defaults() -> Vec<TrackedEntity> {
        vec![
            TrackedEntity {
                label: "Granny".into(),
                menu_label: "Granny ESP".into(),
                feature_id: 3,
                instance: 0x1234_5678,
                color: 0xFFFF_0000,
                style: DrawStyle::Box,
                position: PositionSource::Indirect {
                    reference_offset: 0x28,
                    fallback: [10.0, 5.0, 20.0],
                },
            },
            TrackedEntity {
                label: "Last Sighting".into(),
                menu_label: "Player Position".into(),
                feature_id: 4,
                instance: 0x8765_4321,
                color: 0xFF00_00FF,
                style: DrawStyle::Crosshair,
                position: PositionSource::Direct { offset: 0x20 },
            },
        ]
    }
}

/// Source of world positions for the overlay loop.
pub trait PositionReader {
    /// Position of the object at `instance`. Returns (0,0,0) when the object
    /// is unavailable; callers do not distinguish that from the origin.
    fn read_position(&self, instance: usize, source: &PositionSource) -> Vec3;
}

impl<P: PositionReader + ?Sized> PositionReader for std::sync::Arc<P> {
    fn read_position(&self, instance: usize, source: &PositionSource) -> Vec3 {
        (**self).read_position(instance, source)
    }
}

/// Reads positions by interpreting `PositionSource` descriptors against memory.
pub struct FieldPositionReader<M> {
    memory: M,
}

impl<M: MemoryReader> FieldPositionReader<M> {
    pub fn new(memory: M) -> Self {
        Self { memory }
    }
}

impl<M: MemoryReader> PositionReader for FieldPositionReader<M> {
    fn read_position(&self, instance: usize, source: &PositionSource) -> Vec3 {
        if instance == 0 {
            return Vec3::ZERO;
        }
        match *source {
            PositionSource::Direct { offset } => instance
                .checked_add(offset)
                .and_then(|addr| self.memory.read_vec3(addr))
                .unwrap_or(Vec3::ZERO),
            PositionSource::Indirect { reference_offset, fallback } => {
                tracing::trace!(
                    "indirect position at {instance:#x}+{reference_offset:#x} not followed, using fallback"
                );
                Vec3::from(fallback)
            }
        }
    }
}
