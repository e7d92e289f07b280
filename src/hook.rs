// hook.rs — Waits for the game library, resolves the game functions, starts the overlay.
//
// Flow (runs once, on the installer thread):
//   WaitingForModule -> poll every ~1 s until libil2cpp.so is mapped
//   Resolving        -> base + RVA for each function, in fixed order
//   Running          -> functions published to SharedState, overlay thread started
//
// A function that fails to resolve is published as None and the feature
// depending on it simply stays inert.

use crate::config::{FunctionOffsets, OverlayConfig};
use crate::math::Matrix4x4;
use crate::resolver::AddressResolver;
use crate::state::SharedState;
use std::ffi::c_void;
use std::time::Duration;
use tracing::{info, warn};

/// `UnityEngine.Time.set_timeScale(float)`
pub type SetTimeScaleFn = unsafe extern "C" fn(f32);
/// `UnityEngine.Camera.get_main()`
pub type CameraGetMainFn = unsafe extern "C" fn() -> *mut c_void;
/// `UnityEngine.Camera.get_projectionMatrix_Injected(Camera, out Matrix4x4)`
pub type CameraGetProjectionFn = unsafe extern "C" fn(*mut c_void, *mut Matrix4x4);

/// Absolute addresses of the game functions, `None` where resolution failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolvedFunctions {
    pub set_time_scale: Option<usize>,
    pub camera_get_main: Option<usize>,
    pub camera_get_projection_matrix: Option<usize>,
}

impl ResolvedFunctions {
    pub fn time_scale_fn(&self) -> Option<SetTimeScaleFn> {
        nonzero(self.set_time_scale).map(|a| unsafe { std::mem::transmute::<usize, SetTimeScaleFn>(a) })
    }

    pub fn get_main_fn(&self) -> Option<CameraGetMainFn> {
        nonzero(self.camera_get_main).map(|a| unsafe { std::mem::transmute::<usize, CameraGetMainFn>(a) })
    }

    pub fn projection_matrix_fn(&self) -> Option<CameraGetProjectionFn> {
        nonzero(self.camera_get_projection_matrix)
            .map(|a| unsafe { std::mem::transmute::<usize, CameraGetProjectionFn>(a) })
    }
}

fn nonzero(addr: Option<usize>) -> Option<usize> {
    addr.filter(|&a| a != 0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallerState {
    WaitingForModule,
    Resolving,
    Running,
}

pub struct HookInstaller<R> {
    resolver: R,
    module: String,
    offsets: FunctionOffsets,
    poll_interval: Duration,
    state: InstallerState,
}

impl<R: AddressResolver> HookInstaller<R> {
    pub fn new(resolver: R, config: &OverlayConfig) -> Self {
        Self {
            resolver,
            module: config.module.clone(),
            offsets: config.offsets.clone(),
            poll_interval: config.poll_interval(),
            state: InstallerState::WaitingForModule,
        }
    }

    pub fn state(&self) -> InstallerState {
        self.state
    }

    /// Block until the target module is mapped. Returns its base address.
    pub fn wait_for_module(&mut self) -> usize {
        let mut polls = 0u64;
        loop {
            match self.resolver.require(&self.module) {
                Ok(base) => {
                    info!("{} has been loaded at {:#x} (after {} polls)", self.module, base, polls);
                    self.state = InstallerState::Resolving;
                    return base;
                }
                Err(e) if polls == 0 => info!("{e}, polling every {:?}", self.poll_interval),
                Err(_) => {}
            }
            polls += 1;
            std::thread::sleep(self.poll_interval);
        }
    }

    /// Resolve every game function once, in fixed order.
    pub fn resolve(&self) -> ResolvedFunctions {
        ResolvedFunctions {
            set_time_scale: self.resolve_one("set_timeScale", self.offsets.set_time_scale),
            camera_get_main: self.resolve_one("Camera.get_main", self.offsets.camera_get_main),
            camera_get_projection_matrix: self.resolve_one(
                "Camera.get_projectionMatrix_Injected",
                self.offsets.camera_get_projection_matrix,
            ),
        }
    }

    fn resolve_one(&self, name: &str, offset: usize) -> Option<usize> {
        match self.resolver.resolve(&self.module, offset) {
            Some(addr) if addr != 0 => {
                info!("{name}: {}+{offset:#x} -> {addr:#x}", self.module);
                Some(addr)
            }
            _ => {
                warn!("{name}: {}+{offset:#x} did not resolve, feature disabled", self.module);
                None
            }
        }
    }

    /// Full installation: wait, resolve, publish, then hand over to `start_overlay`.
    /// The installer only reaches `Running` if the overlay actually started.
    pub fn run<T, E>(
        &mut self,
        state: &SharedState,
        start_overlay: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        self.wait_for_module();
        let functions = self.resolve();
        if !state.publish_functions(functions) {
            warn!("game functions were already published, keeping the first set");
        }
        let started = start_overlay()?;
        self.state = InstallerState::Running;
        info!("hooks applied, overlay running");
        Ok(started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OverlayError;
    use std::cell::Cell;

    /// Module appears after `loaded_after` polls; offsets in `missing` never resolve.
    struct ScriptedResolver {
        base: usize,
        loaded_after: u32,
        polls: Cell<u32>,
        missing: Vec<usize>,
    }

    impl AddressResolver for ScriptedResolver {
        fn module_base(&self, module: &str) -> Option<usize> {
            assert_eq!(module, "libil2cpp.so");
            let n = self.polls.get();
            self.polls.set(n + 1);
            (n >= self.loaded_after).then_some(self.base)
        }

        fn resolve(&self, module: &str, offset: usize) -> Option<usize> {
            if self.missing.contains(&offset) {
                return None;
            }
            self.module_base(module).map(|b| b + offset)
        }
    }

    fn fast_config() -> OverlayConfig {
        OverlayConfig { poll_interval_ms: 1, ..OverlayConfig::default() }
    }

    #[test]
    fn waits_until_module_is_loaded() {
        let resolver = ScriptedResolver { base: 0x7000_0000, loaded_after: 3, polls: Cell::new(0), missing: vec![] };
        let mut installer = HookInstaller::new(resolver, &fast_config());
        assert_eq!(installer.state(), InstallerState::WaitingForModule);
        assert_eq!(installer.wait_for_module(), 0x7000_0000);
        assert_eq!(installer.state(), InstallerState::Resolving);
        assert_eq!(installer.resolver.polls.get(), 4);
    }

    #[test]
    fn resolves_all_functions_relative_to_base() {
        let resolver = ScriptedResolver { base: 0x7000_0000, loaded_after: 0, polls: Cell::new(0), missing: vec![] };
        let installer = HookInstaller::new(resolver, &fast_config());
        let f = installer.resolve();
        assert_eq!(f.set_time_scale, Some(0x7000_0000 + 0x2A2CF38));
        assert_eq!(f.camera_get_main, Some(0x7000_0000 + 0x29F4C2C));
        assert_eq!(f.camera_get_projection_matrix, Some(0x7000_0000 + 0x29F4504));
    }

    #[test]
    fn unresolved_function_is_inert_not_fatal() {
        let resolver = ScriptedResolver {
            base: 0x7000_0000,
            loaded_after: 0,
            polls: Cell::new(0),
            missing: vec![0x29F4C2C],
        };
        let state = SharedState::new([0usize]);
        let mut installer = HookInstaller::new(resolver, &fast_config());
        let started = installer.run(&state, || Ok::<_, ()>("overlay"));
        assert_eq!(started, Ok("overlay"));
        assert_eq!(installer.state(), InstallerState::Running);

        let f = state.functions().unwrap();
        assert!(f.time_scale_fn().is_some());
        assert!(f.get_main_fn().is_none());
        assert!(f.projection_matrix_fn().is_some());
    }

    #[test]
    fn failed_overlay_start_does_not_reach_running() {
        let resolver = ScriptedResolver { base: 0x7000_0000, loaded_after: 0, polls: Cell::new(0), missing: vec![] };
        let state = SharedState::new([0usize]);
        let mut installer = HookInstaller::new(resolver, &fast_config());
        let started: std::result::Result<(), &str> = installer.run(&state, || Err("spawn failed"));
        assert_eq!(started, Err("spawn failed"));
        assert_eq!(installer.state(), InstallerState::Resolving);
        // Functions are still published for the menu's time scale control.
        assert!(state.functions().is_some());
    }

    #[test]
    fn missing_module_is_reported_as_not_loaded() {
        let resolver = ScriptedResolver { base: 0x7000_0000, loaded_after: 2, polls: Cell::new(0), missing: vec![] };
        match resolver.require("libil2cpp.so") {
            Err(OverlayError::ModuleNotLoaded(m)) => assert_eq!(m, "libil2cpp.so"),
            other => panic!("expected ModuleNotLoaded, got {other:?}"),
        }
        assert!(resolver.require("libil2cpp.so").is_err());
        assert_eq!(resolver.require("libil2cpp.so").unwrap(), 0x7000_0000);
    }

    #[test]
    fn zero_address_never_becomes_a_function() {
        let f = ResolvedFunctions { set_time_scale: Some(0), ..Default::default() };
        assert!(f.time_scale_fn().is_none());
        assert!(f.get_main_fn().is_none());
    }
}
