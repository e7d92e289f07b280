// memory.rs — Fault-free reads of the host process's own memory.
//
// Game objects are only known through reverse-engineered byte offsets, and
// an instance address may be stale or a placeholder. A plain pointer deref
// would take the whole game down with SIGSEGV, so every read goes through a
// `MemoryReader`, which reports failure instead of faulting:
//
//   Linux/Android -> process_vm_readv on our own pid (EFAULT instead of a crash)
//   Windows       -> VirtualQuery readability check, then copy

use crate::math::Vec3;

pub trait MemoryReader {
    /// Fill `buf` from `addr`. Returns false if any byte is unreadable;
    /// the contents of `buf` are unspecified in that case.
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> bool;

    /// Read a Vector3 (three consecutive f32s).
    fn read_vec3(&self, addr: usize) -> Option<Vec3> {
        let mut b = [0u8; 12];
        self.read_bytes(addr, &mut b).then(|| Vec3::from_ne_bytes(&b))
    }
}

/// Reader over the current process's address space.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessMemory;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl MemoryReader for ProcessMemory {
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> bool {
        if addr == 0 || buf.is_empty() { return false; }
        let local = libc::iovec {
            iov_base: buf.as_mut_ptr() as *mut libc::c_void,
            iov_len: buf.len(),
        };
        let remote = libc::iovec {
            iov_base: addr as *mut libc::c_void,
            iov_len: buf.len(),
        };
        let n = unsafe { libc::process_vm_readv(libc::getpid(), &local, 1, &remote, 1, 0) };
        n >= 0 && n as usize == buf.len()
    }
}

#[cfg(windows)]
impl MemoryReader for ProcessMemory {
    fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> bool {
        unsafe {
            if !is_readable(addr, buf.len()) { return false; }
            std::ptr::copy_nonoverlapping(addr as *const u8, buf.as_mut_ptr(), buf.len());
        }
        true
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
impl MemoryReader for ProcessMemory {
    fn read_bytes(&self, _addr: usize, _buf: &mut [u8]) -> bool {
        false
    }
}

/// Check if a memory region is readable (committed + has read permission).
#[cfg(windows)]
unsafe fn is_readable(addr: usize, len: usize) -> bool {
    use winapi::um::memoryapi::VirtualQuery;
    use winapi::um::winnt::{
        MEMORY_BASIC_INFORMATION, MEM_COMMIT, PAGE_EXECUTE_READ, PAGE_EXECUTE_READWRITE,
        PAGE_EXECUTE_WRITECOPY, PAGE_READONLY, PAGE_READWRITE, PAGE_WRITECOPY,
    };

    if addr == 0 || len == 0 { return false; }
    let readable = PAGE_READONLY | PAGE_READWRITE | PAGE_WRITECOPY
        | PAGE_EXECUTE_READ | PAGE_EXECUTE_READWRITE | PAGE_EXECUTE_WRITECOPY;
    let mut mbi: MEMORY_BASIC_INFORMATION = std::mem::zeroed();
    let ret = VirtualQuery(addr as *const _, &mut mbi,
        std::mem::size_of::<MEMORY_BASIC_INFORMATION>());
    if ret == 0 { return false; }
    if mbi.State != MEM_COMMIT { return false; }
    if mbi.Protect & readable == 0 { return false; }
    addr.checked_add(len)
        .map_or(false, |end| end <= mbi.BaseAddress as usize + mbi.RegionSize)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::MemoryReader;

    /// A fake address space: one contiguous block mapped at `base`.
    pub struct SliceMemory {
        pub base: usize,
        pub bytes: Vec<u8>,
    }

    impl SliceMemory {
        pub fn new(base: usize, len: usize) -> Self {
            Self { base, bytes: vec![0; len] }
        }

        pub fn write(&mut self, addr: usize, data: &[u8]) {
            let at = addr - self.base;
            self.bytes[at..at + data.len()].copy_from_slice(data);
        }

        pub fn write_vec3(&mut self, addr: usize, v: [f32; 3]) {
            for (i, c) in v.iter().enumerate() {
                self.write(addr + i * 4, &c.to_ne_bytes());
            }
        }
    }

    impl MemoryReader for SliceMemory {
        fn read_bytes(&self, addr: usize, buf: &mut [u8]) -> bool {
            let Some(at) = addr.checked_sub(self.base) else { return false };
            let Some(src) = self.bytes.get(at..at + buf.len()) else { return false };
            buf.copy_from_slice(src);
            true
        }
    }
}
