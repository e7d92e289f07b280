// resolver.rs — Locates a loaded native module and turns relative offsets into
// absolute addresses inside the host process.
//
//   Linux/Android -> the module base is the lowest mapping of the library in /proc/self/maps
//   Windows       -> GetModuleHandleA (the HMODULE is the image base)
//
// Everything above this module only sees the `AddressResolver` trait, so the
// installer can be driven by a scripted resolver in tests.

use crate::error::{OverlayError, Result};

/// Contract consumed by the hook installer.
pub trait AddressResolver {
    /// Base address of `module` if it is currently loaded.
    fn module_base(&self, module: &str) -> Option<usize>;

    /// Absolute address of `offset` bytes into `module`.
    /// Only meaningful once the module is loaded; `None` otherwise.
    fn resolve(&self, module: &str, offset: usize) -> Option<usize> {
        self.module_base(module)
            .and_then(|base| base.checked_add(offset))
    }

    /// Base of `module`, or `ModuleNotLoaded`.
    fn require(&self, module: &str) -> Result<usize> {
        self.module_base(module)
            .ok_or_else(|| OverlayError::ModuleNotLoaded(module.to_string()))
    }
}

/// Resolver backed by the current process's module list.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessModules;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl AddressResolver for ProcessModules {
    fn module_base(&self, module: &str) -> Option<usize> {
        let maps = std::fs::read_to_string("/proc/self/maps").ok()?;
        find_module_base(&maps, module)
    }
}

#[cfg(windows)]
impl AddressResolver for ProcessModules {
    fn module_base(&self, module: &str) -> Option<usize> {
        use winapi::um::libloaderapi::GetModuleHandleA;

        let name = std::ffi::CString::new(module).ok()?;
        let h = unsafe { GetModuleHandleA(name.as_ptr()) };
        if h.is_null() { None } else { Some(h as usize) }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl AddressResolver for ProcessModules {
    fn module_base(&self, _module: &str) -> Option<usize> {
        None
    }
}

/// Scan a /proc/<pid>/maps listing for the lowest mapping whose path file
/// name is exactly `module`.
///
/// Line format: `start-end perms offset dev inode [path]`.
pub fn find_module_base(maps: &str, module: &str) -> Option<usize> {
    maps.lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let range = cols.next()?;
            // perms, offset, dev, inode
            let path = cols.nth(4)?;
            let file = path.rsplit('/').next()?;
            if file != module { return None; }
            let start = range.split('-').next()?;
            usize::from_str_radix(start, 16).ok()
        })
        .min()
}

/// Parse an offset literal such as `"0x2A2CF38"` (prefix optional).
pub fn parse_offset(text: &str) -> Result<usize> {
    let t = text.trim();
    let digits = t
        .strip_prefix("0x")
        .or_else(|| t.strip_prefix("0X"))
        .unwrap_or(t);
    if digits.is_empty() {
        return Err(OverlayError::InvalidOffset(text.to_string()));
    }
    usize::from_str_radix(digits, 16)
        .map_err(|_| OverlayError::InvalidOffset(text.to_string()))
}
