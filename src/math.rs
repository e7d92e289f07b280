// math.rs — Vector and matrix value types shared by the readers and the projection.

/// A 3-component vector (x, y, z) matching the engine's Vector3 layout.
/// Used for world-space positions read out of game objects.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from 12 bytes in native byte order, as read out of process memory.
    pub fn from_ne_bytes(b: &[u8; 12]) -> Self {
        let f = |i: usize| f32::from_ne_bytes([b[i], b[i + 1], b[i + 2], b[i + 3]]);
        Self { x: f(0), y: f(4), z: f(8) }
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self { x: v[0], y: v[1], z: v[2] }
    }
}

/// Screen-space pixel position. Y grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Camera view-projection transform, laid out exactly as Unity's
/// `get_projectionMatrix_Injected` writes it into the out-parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C)]
pub struct Matrix4x4 {
    pub m: [f32; 16],
}

impl Matrix4x4 {
    pub const ZERO: Matrix4x4 = Matrix4x4 { m: [0.0; 16] };

    pub fn is_zero(&self) -> bool {
        self.m.iter().all(|&v| v == 0.0)
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_from_ne_bytes() {
        let mut buf = [0u8; 12];
        buf[0..4].copy_from_slice(&1.5f32.to_ne_bytes());
        buf[4..8].copy_from_slice(&(-2.0f32).to_ne_bytes());
        buf[8..12].copy_from_slice(&30.25f32.to_ne_bytes());
        assert_eq!(Vec3::from_ne_bytes(&buf), Vec3::new(1.5, -2.0, 30.25));
    }

    #[test]
    fn zero_matrix_checks() {
        assert!(Matrix4x4::default().is_zero());
        let mut m = Matrix4x4::ZERO;
        m.m[15] = 1.0;
        assert!(!m.is_zero());
    }
}
