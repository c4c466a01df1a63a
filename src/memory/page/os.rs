/*!
 * Platform Memory
 * Anonymous mappings, page locking and physical memory queries
 */

use crate::core::types::Size;
use std::io;
use std::ptr::NonNull;

/// Low level memory operations the page backend is built on
///
/// The page backend has nothing to do with the concrete syscalls offered by
/// each kernel, so they sit behind this seam.
pub trait PlatformMemory: Send {
    /// Request a zero-initialized, read-write anonymous mapping of `len` bytes
    fn map(&mut self, len: Size) -> io::Result<NonNull<u8>>;

    /// Return the mapping of `len` bytes starting at `addr` to the kernel
    ///
    /// # Safety
    /// `addr`/`len` must describe a live mapping obtained from [`map`] that
    /// nothing references any more.
    ///
    /// [`map`]: PlatformMemory::map
    unsafe fn unmap(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()>;

    /// Pin the range in physical memory
    ///
    /// # Safety
    /// The range must lie inside a live mapping owned by the caller.
    unsafe fn lock(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()>;

    /// Allow the range to be swapped out again
    ///
    /// # Safety
    /// The range must lie inside a live mapping owned by the caller.
    unsafe fn unlock(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()>;

    /// Virtual memory page size in bytes
    fn page_size(&self) -> Size;

    /// Currently free physical memory in bytes
    fn available_physical(&self) -> Size;
}

/// The host operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemory;

#[cfg(unix)]
mod unix {
    use super::{PlatformMemory, SystemMemory};
    use crate::core::types::Size;
    use libc::{c_int, c_void, off_t};
    use std::io;
    use std::ptr::{self, NonNull};

    const FALLBACK_PAGE_SIZE: Size = 4096;

    impl PlatformMemory for SystemMemory {
        fn map(&mut self, len: Size) -> io::Result<NonNull<u8>> {
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            // SAFETY: a fresh anonymous mapping does not alias existing memory.
            let addr = unsafe { libc::mmap(ptr::null_mut(), len, PROT, FLAGS, FD, OFFSET) };

            if addr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }
            NonNull::new(addr.cast::<u8>())
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))
        }

        unsafe fn unmap(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()> {
            // SAFETY: upheld by the caller.
            let rc = unsafe { libc::munmap(addr.as_ptr().cast::<c_void>(), len) };
            if rc == 0 {
                Ok(())
            } else {
                Err(io::Error::last_os_error())
            }
        }

        unsafe fn lock(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()> {
            // SAFETY: upheld by the caller.
            let rc = unsafe { libc::mlock(addr.as_ptr().cast::<c_void>() as *const c_void, len) };
            if rc == 0 {
                Ok(())
            } else {
                Err(io::Error::last_os_error())
            }
        }

        unsafe fn unlock(&mut self, addr: NonNull<u8>, len: Size) -> io::Result<()> {
            // SAFETY: upheld by the caller.
            let rc =
                unsafe { libc::munlock(addr.as_ptr().cast::<c_void>() as *const c_void, len) };
            if rc == 0 {
                Ok(())
            } else {
                Err(io::Error::last_os_error())
            }
        }

        fn page_size(&self) -> Size {
            // SAFETY: sysconf has no memory safety preconditions.
            let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
            if size > 0 {
                size as Size
            } else {
                FALLBACK_PAGE_SIZE
            }
        }

        fn available_physical(&self) -> Size {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            let name = libc::_SC_AVPHYS_PAGES;
            #[cfg(not(any(target_os = "linux", target_os = "android")))]
            let name = libc::_SC_PHYS_PAGES;

            // SAFETY: sysconf has no memory safety preconditions.
            let pages = unsafe { libc::sysconf(name) };
            if pages < 0 {
                return 0;
            }
            self.page_size().saturating_mul(pages as Size)
        }
    }
}

#[cfg(not(unix))]
mod unsupported {
    use super::{PlatformMemory, SystemMemory};
    use crate::core::types::Size;
    use std::io;
    use std::ptr::NonNull;

    fn unsupported() -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "page backend requires a unix host",
        )
    }

    impl PlatformMemory for SystemMemory {
        fn map(&mut self, _len: Size) -> io::Result<NonNull<u8>> {
            Err(unsupported())
        }

        unsafe fn unmap(&mut self, _addr: NonNull<u8>, _len: Size) -> io::Result<()> {
            Err(unsupported())
        }

        unsafe fn lock(&mut self, _addr: NonNull<u8>, _len: Size) -> io::Result<()> {
            Err(unsupported())
        }

        unsafe fn unlock(&mut self, _addr: NonNull<u8>, _len: Size) -> io::Result<()> {
            Err(unsupported())
        }

        fn page_size(&self) -> Size {
            4096
        }

        fn available_physical(&self) -> Size {
            0
        }
    }
}
