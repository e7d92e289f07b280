// projection.rs — World-to-screen projection.
//
// Pipeline: world position -> clip space (matrix multiply) -> NDC (divide by w)
// -> pixels (scale to viewport, flip Y so the origin is top-left).

use crate::math::{Matrix4x4, Vec2, Vec3};

/// Points with a clip-space w below this are behind or on the camera plane.
pub const MIN_CLIP_W: f32 = 0.01;

/// Viewport used when the canvas cannot report its size.
pub const FALLBACK_WIDTH: i32 = 1920;
pub const FALLBACK_HEIGHT: i32 = 1080;

/// Screen dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const FALLBACK: Viewport = Viewport { width: FALLBACK_WIDTH, height: FALLBACK_HEIGHT };

    /// Use the reported size, or the 1920x1080 fallback if either side is unknown (<= 0).
    pub fn or_fallback(width: i32, height: i32) -> Self {
        if width <= 0 || height <= 0 {
            Self::FALLBACK
        } else {
            Self { width, height }
        }
    }
}

/// Project `world` through `matrix` onto a `width` x `height` screen.
///
/// Returns `None` when the point is behind the camera (w < 0.01). An all-zero
/// matrix (no camera this frame) always lands here too. A zero-sized viewport
/// is treated as 1920x1080.
pub fn world_to_screen(world: Vec3, matrix: &Matrix4x4, width: i32, height: i32) -> Option<Vec2> {
    let m = &matrix.m;
    let Vec3 { x, y, z } = world;

    let w = m[3] * x + m[7] * y + m[11] * z + m[15];
    if w < MIN_CLIP_W {
        return None;
    }

    let cx = m[0] * x + m[4] * y + m[8] * z + m[12];
    let cy = m[1] * x + m[5] * y + m[9] * z + m[13];

    let nx = cx / w;
    let ny = cy / w;

    let vp = Viewport::or_fallback(width, height);
    Some(Vec2::new(
        (vp.width as f32 / 2.0) * (nx + 1.0),
        (vp.height as f32 / 2.0) * (1.0 - ny), // NDC Y is up, screen Y is down
    ))
}
