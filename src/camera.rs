// camera.rs — Reads the main camera's projection matrix through the game's own accessors.
//
//   Camera.get_main()                          -> Camera* (null between scenes)
//   Camera.get_projectionMatrix_Injected(c, &m) -> fills m
//
// Any missing piece yields the all-zero matrix, which the projection rejects
// (w = 0), so callers never need a separate "no camera" branch.

use crate::hook::ResolvedFunctions;
use crate::math::Matrix4x4;
use crate::state::SharedState;
use std::sync::Arc;

/// Source of the per-frame view-projection matrix.
pub trait MatrixSource {
    fn read_matrix(&self) -> Matrix4x4;
}

impl<M: MatrixSource + ?Sized> MatrixSource for Arc<M> {
    fn read_matrix(&self) -> Matrix4x4 {
        (**self).read_matrix()
    }
}

/// Reads the matrix by calling the resolved camera accessors.
pub struct CameraMatrixReader {
    state: Arc<SharedState>,
}

impl CameraMatrixReader {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self { state }
    }
}

impl MatrixSource for CameraMatrixReader {
    fn read_matrix(&self) -> Matrix4x4 {
        match self.state.functions() {
            Some(f) => unsafe { read_camera_matrix(f) },
            None => Matrix4x4::ZERO,
        }
    }
}

/// Call the camera accessors resolved in `f`.
///
/// # Safety
/// Every address in `f` must be either `None` or the entry point of the
/// function its type describes.
pub unsafe fn read_camera_matrix(f: &ResolvedFunctions) -> Matrix4x4 {
    let mut matrix = Matrix4x4::ZERO;
    let (Some(get_main), Some(get_projection)) = (f.get_main_fn(), f.projection_matrix_fn()) else {
        return matrix;
    };
    let camera = get_main();
    if camera.is_null() {
        return matrix;
    }
    get_projection(camera, &mut matrix);
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;

    static CAMERA: u8 = 0;

    unsafe extern "C" fn main_camera() -> *mut c_void {
        &CAMERA as *const u8 as *mut c_void
    }

    unsafe extern "C" fn no_camera() -> *mut c_void {
        std::ptr::null_mut()
    }

    unsafe extern "C" fn projection(camera: *mut c_void, out: *mut Matrix4x4) {
        assert_eq!(camera as *const u8, &CAMERA as *const u8);
        let m = &mut *out;
        for (i, v) in m.m.iter_mut().enumerate() {
            *v = i as f32;
        }
    }

    fn functions(get_main: Option<usize>, get_projection: Option<usize>) -> ResolvedFunctions {
        ResolvedFunctions {
            set_time_scale: None,
            camera_get_main: get_main,
            camera_get_projection_matrix: get_projection,
        }
    }

    #[test]
    fn reads_matrix_through_accessors() {
        let f = functions(Some(main_camera as usize), Some(projection as usize));
        let m = unsafe { read_camera_matrix(&f) };
        assert_eq!(m.m[0], 0.0);
        assert_eq!(m.m[5], 5.0);
        assert_eq!(m.m[15], 15.0);
    }

    #[test]
    fn missing_accessor_or_camera_gives_zero_matrix() {
        let cases = [
            functions(None, Some(projection as usize)),
            functions(Some(main_camera as usize), None),
            functions(None, None),
            functions(Some(no_camera as usize), Some(projection as usize)),
        ];
        for f in &cases {
            assert!(unsafe { read_camera_matrix(f) }.is_zero());
        }
    }

    #[test]
    fn reader_before_installation_gives_zero_matrix() {
        let state = Arc::new(SharedState::new([0usize]));
        let reader = CameraMatrixReader::new(state.clone());
        assert!(reader.read_matrix().is_zero());

        state.publish_functions(functions(Some(main_camera as usize), Some(projection as usize)));
        assert_eq!(reader.read_matrix().m[10], 10.0);
    }
}
