/*!
 * Boundary Bridge
 *
 * Plain-value operations for a foreign-language caller. Every call goes to
 * the global manager; failures are logged and reported as `0`, `false` or
 * `0.0` so no error type has to cross the boundary.
 */

use super::global::global;
use super::manager::NativeMemoryManager;
use crate::core::types::{Handle, Size, NULL_HANDLE};
use tracing::{error, warn};

/// Initialize (or reinitialize) the global pool; `false` on failure
pub fn initialize_pool(size: u64) -> bool {
    initialize_pool_in(global(), size)
}

/// Allocate from the global manager; [`NULL_HANDLE`] on failure
pub fn allocate(size: u64, tag: &str) -> Handle {
    allocate_in(global(), size, tag)
}

/// Free a handle; `false` when it was not live
pub fn free(handle: Handle) -> bool {
    free_in(global(), handle)
}

pub fn free_all() {
    free_all_in(global())
}

pub fn total_allocated() -> u64 {
    total_allocated_in(global())
}

pub fn available() -> u64 {
    available_in(global())
}

pub fn fragmentation_ratio() -> f64 {
    fragmentation_ratio_in(global())
}

pub fn defragment() {
    defragment_in(global())
}

fn to_size(value: u64) -> Option<Size> {
    Size::try_from(value).ok()
}

pub(crate) fn initialize_pool_in(manager: &NativeMemoryManager, size: u64) -> bool {
    let Some(size) = to_size(size) else {
        warn!(size, "Pool size does not fit in a native word");
        return false;
    };
    match manager.initialize_pool(size) {
        Ok(()) => true,
        Err(e) => {
            error!(size, error = %e, "Pool initialization failed");
            false
        }
    }
}

pub(crate) fn allocate_in(manager: &NativeMemoryManager, size: u64, tag: &str) -> Handle {
    let Some(size) = to_size(size) else {
        warn!(size, tag, "Allocation size does not fit in a native word");
        return NULL_HANDLE;
    };
    match manager.allocate(size, tag) {
        Ok(handle) => handle,
        Err(e) => {
            warn!(size, tag, kind = ?e.kind(), error = %e, "Allocation failed");
            NULL_HANDLE
        }
    }
}

pub(crate) fn free_in(manager: &NativeMemoryManager, handle: Handle) -> bool {
    match manager.free(handle) {
        Ok(()) => true,
        Err(e) => {
            warn!(handle, kind = ?e.kind(), error = %e, "Free failed");
            false
        }
    }
}

pub(crate) fn free_all_in(manager: &NativeMemoryManager) {
    if let Err(e) = manager.free_all() {
        warn!(error = %e, "Free all failed");
    }
}

pub(crate) fn total_allocated_in(manager: &NativeMemoryManager) -> u64 {
    manager.total_allocated().map_or(0, |bytes| bytes as u64)
}

pub(crate) fn available_in(manager: &NativeMemoryManager) -> u64 {
    manager.available().map_or(0, |bytes| bytes as u64)
}

pub(crate) fn fragmentation_ratio_in(manager: &NativeMemoryManager) -> f64 {
    manager.fragmentation_ratio().unwrap_or(0.0)
}

pub(crate) fn defragment_in(manager: &NativeMemoryManager) {
    if let Err(e) = manager.defragment() {
        warn!(error = %e, "Defragment failed");
    }
}
