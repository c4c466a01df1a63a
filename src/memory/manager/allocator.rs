/*!
 * Facade Allocation Operations
 * Allocate, free and maintenance calls routed to the active backend
 */

use super::NativeMemoryManager;
use crate::core::types::{address_from_handle, handle_from_address, Address, Handle, Size};
use crate::memory::types::{MemoryError, MemoryResult};
use tracing::{debug, info, warn};

/// Resolve a boundary handle to a native address
fn address_of(handle: Handle) -> MemoryResult<Address> {
    address_from_handle(handle).ok_or_else(|| {
        warn!(handle, "Rejected null or out-of-range handle");
        MemoryError::InvalidPointer(handle as Address)
    })
}

impl NativeMemoryManager {
    /// Allocate `size` bytes tagged with `tag`
    ///
    /// A failed allocation leaves every counter and region untouched.
    pub fn allocate(&self, size: Size, tag: &str) -> MemoryResult<Handle> {
        let mut state = self.state.lock();
        let address = state.active_mut()?.allocate(size, tag)?;
        Ok(handle_from_address(address))
    }

    /// Release the region behind `handle`
    ///
    /// Unknown, null and already-freed handles fail with `InvalidPointer`
    /// and change nothing.
    pub fn free(&self, handle: Handle) -> MemoryResult<()> {
        let address = address_of(handle)?;
        let mut state = self.state.lock();
        let size = state.active_mut()?.free(address)?;
        debug!(handle, size, "Handle released");
        Ok(())
    }

    /// Release every outstanding region; safe on an empty allocator
    pub fn free_all(&self) -> MemoryResult<()> {
        let mut state = self.state.lock();
        state.active_mut()?.free_all();
        Ok(())
    }

    pub fn total_allocated(&self) -> MemoryResult<Size> {
        Ok(self.state.lock().active()?.total_allocated())
    }

    /// Pool: bytes left in the pool. Page: live free physical memory.
    pub fn available(&self) -> MemoryResult<Size> {
        Ok(self.state.lock().active()?.available())
    }

    /// Whether a request of `size` bytes could currently be served
    ///
    /// Reports `false` rather than an error when the pool is not initialized.
    pub fn is_memory_available(&self, size: Size) -> bool {
        self.state
            .lock()
            .active()
            .map_or(false, |backend| backend.is_memory_available(size))
    }

    /// Free regions per kilobyte of free space; always `0.0` for pages
    pub fn fragmentation_ratio(&self) -> MemoryResult<f64> {
        Ok(self.state.lock().active()?.fragmentation_ratio())
    }

    /// Merge adjacent free regions, returning the number of merges
    ///
    /// No-op for the page backend.
    pub fn defragment(&self) -> MemoryResult<usize> {
        let mut state = self.state.lock();
        let merges = state.active_mut()?.defragment();
        if merges > 0 {
            info!(merges, "Defragmented pool");
        }
        Ok(merges)
    }

    /// Check the active backend's structural invariants
    pub fn validate(&self) -> MemoryResult<()> {
        self.state.lock().active()?.validate()
    }

    /// Lock the mapping behind `handle` against swap (page backend only)
    pub fn pin(&self, handle: Handle) -> MemoryResult<()> {
        let address = address_of(handle)?;
        let mut state = self.state.lock();
        let pages = state.pages_mut("pin")?;
        let size = pages
            .mapping(address)
            .map(|mapping| mapping.size)
            .ok_or(MemoryError::InvalidPointer(address))?;
        pages.pin(address, size)
    }

    /// Let the mapping behind `handle` be swapped out (page backend only)
    pub fn unpin(&self, handle: Handle) -> MemoryResult<()> {
        let address = address_of(handle)?;
        let mut state = self.state.lock();
        let pages = state.pages_mut("unpin")?;
        let size = pages
            .mapping(address)
            .map(|mapping| mapping.size)
            .ok_or(MemoryError::InvalidPointer(address))?;
        pages.unpin(address, size)
    }
}
