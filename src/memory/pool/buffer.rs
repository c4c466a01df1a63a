/*!
 * Pool Backing Buffer
 * Owned, zeroed allocation that regions are carved from
 */

use crate::core::limits::POOL_BUFFER_ALIGN;
use crate::core::types::{Address, Size};
use crate::memory::types::{MemoryError, MemoryResult};
use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Contiguous buffer owned exclusively by one pool
///
/// Released when dropped. Addresses inside it are only handed out through
/// the pool's block table.
pub(crate) struct PoolBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The buffer is plain bytes owned by this value; all access is serialized by
// the facade lock.
unsafe impl Send for PoolBuffer {}

impl PoolBuffer {
    pub(crate) fn allocate(size: Size) -> MemoryResult<Self> {
        if size == 0 {
            return Err(MemoryError::InvalidSize(size));
        }

        let layout = Layout::from_size_align(size, POOL_BUFFER_ALIGN).map_err(|e| {
            MemoryError::AllocationFailed {
                size,
                reason: e.to_string(),
            }
        })?;

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };

        NonNull::new(ptr)
            .map(|ptr| Self { ptr, layout })
            .ok_or_else(|| MemoryError::AllocationFailed {
                size,
                reason: "system allocator returned null".to_string(),
            })
    }

    #[inline]
    pub(crate) fn base(&self) -> Address {
        self.ptr.as_ptr() as Address
    }

    #[inline]
    pub(crate) fn len(&self) -> Size {
        self.layout.size()
    }
}

impl Drop for PoolBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was returned by alloc_zeroed with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
