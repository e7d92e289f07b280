// canvas.rs — The drawing surface the overlay renders onto.
//
// Drawing itself happens outside this library: the host (the Java overlay
// view on Android) registers a table of C callbacks once it has a surface.
// Until then every draw is dropped and the size reads as 0 ("unknown"),
// which the projection turns into the 1920x1080 fallback.

use once_cell::sync::OnceCell;
use std::ffi::{c_char, c_int, CString};
use std::sync::Arc;

/// Colors are packed 0xAARRGGBB.
pub type Argb = u32;

pub trait Canvas {
    fn draw_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Argb);
    fn draw_text(&self, x: f32, y: f32, size: f32, text: &str, color: Argb);
    /// Width in pixels, 0 if unknown.
    fn screen_width(&self) -> i32;
    /// Height in pixels, 0 if unknown.
    fn screen_height(&self) -> i32;
}

impl<C: Canvas + ?Sized> Canvas for Arc<C> {
    fn draw_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Argb) {
        (**self).draw_line(x1, y1, x2, y2, thickness, color)
    }
    fn draw_text(&self, x: f32, y: f32, size: f32, text: &str, color: Argb) {
        (**self).draw_text(x, y, size, text, color)
    }
    fn screen_width(&self) -> i32 { (**self).screen_width() }
    fn screen_height(&self) -> i32 { (**self).screen_height() }
}

/// Callback table handed over by the host. Any entry may be null.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct CanvasVTable {
    pub draw_line: Option<unsafe extern "C" fn(f32, f32, f32, f32, f32, u32)>,
    pub draw_text: Option<unsafe extern "C" fn(f32, f32, f32, *const c_char, u32)>,
    pub screen_width: Option<unsafe extern "C" fn() -> c_int>,
    pub screen_height: Option<unsafe extern "C" fn() -> c_int>,
}

/// Canvas that forwards to the host's callback table once registered.
#[derive(Default)]
pub struct HostCanvas {
    table: OnceCell<CanvasVTable>,
}

impl HostCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the host's callbacks. Only the first registration wins.
    pub fn register(&self, table: CanvasVTable) -> bool {
        let ok = self.table.set(table).is_ok();
        if ok {
            tracing::info!("canvas registered");
        } else {
            tracing::warn!("canvas already registered, ignoring");
        }
        ok
    }

    pub fn is_registered(&self) -> bool {
        self.table.get().is_some()
    }
}

impl Canvas for HostCanvas {
    fn draw_line(&self, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32, color: Argb) {
        if let Some(f) = self.table.get().and_then(|t| t.draw_line) {
            unsafe { f(x1, y1, x2, y2, thickness, color) }
        }
    }

    fn draw_text(&self, x: f32, y: f32, size: f32, text: &str, color: Argb) {
        let Some(f) = self.table.get().and_then(|t| t.draw_text) else { return };
        let Ok(s) = CString::new(text) else { return };
        unsafe { f(x, y, size, s.as_ptr(), color) }
    }

    fn screen_width(&self) -> i32 {
        match self.table.get().and_then(|t| t.screen_width) {
            Some(f) => unsafe { f() },
            None => 0,
        }
    }

    fn screen_height(&self) -> i32 {
        match self.table.get().and_then(|t| t.screen_height) {
            Some(f) => unsafe { f() },
            None => 0,
        }
    }
}
