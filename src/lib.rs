// lib.rs — Load-time entry point and C ABI of the Granny overlay library.
//
// When the library is loaded into the game process, the constructor below
// spawns an installer thread that:
//   1. Waits for libil2cpp.so to be mapped
//   2. Resolves the game functions (time scale, camera accessors)
//   3. Starts the 60 fps overlay thread
//
// The host (menu + overlay view) talks to the library only through the
// `overlay_*` exports at the bottom of this file.

// Internal modules
pub mod camera;     // Camera matrix through Camera.get_main / get_projectionMatrix
pub mod canvas;     // Drawing surface trait, host callback table
pub mod config;     // Offsets and targets, TOML overrides
pub mod entities;   // Tracked targets, world position reads
pub mod error;      // OverlayError
pub mod esp;        // Per-frame box/crosshair drawing
pub mod hook;       // Module wait + function resolution
pub mod logging;    // tracing subscriber setup
pub mod math;       // Vec2, Vec3, Matrix4x4
pub mod memory;     // Fault-free reads of our own address space
pub mod menu;       // Mod menu feature list + change callback
pub mod projection; // World-to-screen
pub mod resolver;   // Module base lookup, base + RVA
pub mod scheduler;  // Overlay thread with stop handle
pub mod state;      // Toggles and instances shared between threads

use crate::camera::CameraMatrixReader;
use crate::canvas::{CanvasVTable, HostCanvas};
use crate::config::OverlayConfig;
use crate::entities::FieldPositionReader;
use crate::esp::EspOverlay;
use crate::hook::HookInstaller;
use crate::memory::ProcessMemory;
use crate::menu::{Menu, MenuChange};
use crate::resolver::ProcessModules;
use crate::scheduler::SchedulerHandle;
use crate::state::SharedState;
use libc::{c_char, c_int};
use once_cell::sync::Lazy;
use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex, PoisonError};
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Everything the exports and the background threads share.
struct Runtime {
    config: OverlayConfig,
    state: Arc<SharedState>,
    canvas: Arc<HostCanvas>,
    menu: Menu,
    /// `menu` encoded once, kept alive for the pointers handed to the host.
    features: Vec<CString>,
}

impl Runtime {
    fn new(config: OverlayConfig) -> Self {
        let state = Arc::new(SharedState::new(config.entities.iter().map(|e| e.instance)));
        let menu = Menu::new(&config);
        let features = menu
            .encoded()
            .into_iter()
            .filter_map(|s| match CString::new(s) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("menu entry with interior NUL skipped: {e}");
                    None
                }
            })
            .collect();
        info!("runtime ready: {} targets, {} menu rows", config.entities.len(), menu.features().len());
        Runtime { config, state, canvas: Arc::new(HostCanvas::new()), menu, features }
    }
}

// Built on first use: on the installer thread at load, or by the first export call.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    logging::init();
    Runtime::new(OverlayConfig::from_env())
});

/// Handle of the running overlay thread, set by the installer.
static SCHEDULER: Mutex<Option<SchedulerHandle>> = Mutex::new(None);

/// Installer thread body: wait, resolve, start the overlay, park its handle.
#[cfg_attr(test, allow(dead_code))]
fn install(rt: &'static Runtime) {
    let mut installer = HookInstaller::new(ProcessModules, &rt.config);
    let started = installer.run(&rt.state, || {
        let overlay = EspOverlay::new(
            CameraMatrixReader::new(rt.state.clone()),
            FieldPositionReader::new(ProcessMemory),
            rt.canvas.clone(),
            rt.config.entities.clone(),
            rt.state.clone(),
        );
        scheduler::start(overlay, rt.config.frame_interval())
    });

    if !rt.canvas.is_registered() {
        info!("no canvas registered yet, frames are dropped until the host registers one");
    }
    match started {
        Ok(handle) => *SCHEDULER.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle),
        Err(e) => error!("failed to start overlay thread: {e}"),
    }
}

/// Start `body` on the installer thread. `runtime` is forced there, so config
/// I/O and subscriber setup never run inside the loader's constructor.
fn spawn_installer(runtime: &'static Lazy<Runtime>, body: fn(&'static Runtime)) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("hook-installer".into())
        .spawn(move || body(Lazy::force(runtime)))
}

// Constructor - runs when the library is loaded
#[cfg(not(test))]
#[ctor::ctor]
fn init() {
    if let Err(e) = spawn_installer(&RUNTIME, install) {
        logging::init();
        error!("failed to spawn installer thread: {e}");
    }
}

// ============================================================
// C ABI
// ============================================================

unsafe fn opt_str(p: *const c_char) -> Option<String> {
    (!p.is_null()).then(|| CStr::from_ptr(p).to_string_lossy().into_owned())
}

/// Register the host's drawing callbacks. Returns false if one was already registered.
#[no_mangle]
pub extern "C" fn overlay_set_canvas(table: CanvasVTable) -> bool {
    RUNTIME.canvas.register(table)
}

/// Menu change callback.
///
/// # Safety
/// `name` and `text` must each be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn overlay_on_change(
    feature: c_int,
    name: *const c_char,
    int_value: c_int,
    long_value: i64,
    bool_value: bool,
    text: *const c_char,
) {
    let change = MenuChange {
        feature,
        name: opt_str(name).unwrap_or_default(),
        int_value,
        long_value,
        bool_value,
        text: opt_str(text),
    };
    RUNTIME.menu.apply(&RUNTIME.state, &change);
}

#[no_mangle]
pub extern "C" fn overlay_feature_count() -> c_int {
    RUNTIME.features.len() as c_int
}

/// Menu string at `index`, null when out of range. Valid for the life of the library.
#[no_mangle]
pub extern "C" fn overlay_feature(index: c_int) -> *const c_char {
    usize::try_from(index)
        .ok()
        .and_then(|i| RUNTIME.features.get(i))
        .map_or(std::ptr::null(), |s| s.as_ptr())
}

/// Report the live instance address of target `index`.
#[no_mangle]
pub extern "C" fn overlay_set_instance(index: usize, address: usize) -> bool {
    match RUNTIME.state.slot(index) {
        Some(slot) => {
            slot.set_instance(address);
            info!("instance of target {index} set to {address:#x}");
            true
        }
        None => {
            warn!("no target with index {index}");
            false
        }
    }
}

/// Stop the overlay thread. A no-op before it has started.
#[no_mangle]
pub extern "C" fn overlay_shutdown() {
    let handle = SCHEDULER.lock().unwrap_or_else(PoisonError::into_inner).take();
    match handle {
        Some(h) => {
            if !h.is_running() {
                warn!("overlay thread had already exited");
            }
            h.stop();
        }
        None => info!("shutdown requested, overlay not running"),
    }
}
