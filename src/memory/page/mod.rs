/*!
 * Page Allocator
 *
 * Every allocation is its own anonymous OS mapping, pinned against swap for
 * as long as it is live. Nothing is pooled, split or coalesced: the tradeoff
 * is one syscall pair per allocation in exchange for per-allocation isolation
 * and guaranteed physical residency.
 */

mod os;

pub use os::{PlatformMemory, SystemMemory};

use super::traits::RegionAllocator;
use super::types::{
    BackendKind, MemoryError, MemoryRegion, MemoryResult, MemoryStats, PageMapping,
};
use crate::core::types::{Address, Size};
use std::collections::BTreeMap;
use std::ptr::NonNull;
use tracing::{debug, error, info, warn};

/// Direct OS-page allocator
pub struct PageAllocator<P: PlatformMemory = SystemMemory> {
    platform: P,
    mappings: BTreeMap<Address, PageMapping>,
    total_allocated: Size,
}

impl PageAllocator<SystemMemory> {
    pub fn new() -> Self {
        Self::with_platform(SystemMemory)
    }
}

impl Default for PageAllocator<SystemMemory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PlatformMemory> PageAllocator<P> {
    pub fn with_platform(platform: P) -> Self {
        Self {
            platform,
            mappings: BTreeMap::new(),
            total_allocated: 0,
        }
    }

    /// Map and pin `size` fresh zeroed bytes
    ///
    /// Either both steps succeed or nothing is left mapped.
    pub fn allocate(&mut self, size: Size, tag: &str) -> MemoryResult<Address> {
        if size == 0 {
            return Err(MemoryError::InvalidSize(size));
        }

        let ptr = self.platform.map(size).map_err(|e| {
            error!(size, tag, error = %e, "mmap failed");
            MemoryError::AllocationFailed {
                size,
                reason: format!("mmap failed: {}", e),
            }
        })?;

        // SAFETY: ptr/size is the mapping we just created.
        if let Err(e) = unsafe { self.platform.lock(ptr, size) } {
            error!(size, tag, error = %e, "mlock failed, releasing mapping");
            // SAFETY: the mapping was never handed out.
            if let Err(unmap_err) = unsafe { self.platform.unmap(ptr, size) } {
                error!(size, error = %unmap_err, "munmap of unpinned mapping failed");
            }
            return Err(MemoryError::AllocationFailed {
                size,
                reason: format!("mlock failed: {}", e),
            });
        }

        let address = ptr.as_ptr() as Address;
        self.mappings.insert(
            address,
            PageMapping {
                address,
                size,
                tag: tag.to_string(),
                pinned: true,
            },
        );
        self.total_allocated += size;

        debug!(
            size,
            tag,
            address = format_args!("0x{:x}", address),
            mappings = self.mappings.len(),
            "Mapped and pinned pages"
        );

        Ok(address)
    }

    /// Unpin and unmap the mapping at `address`
    ///
    /// `size` must equal the size the mapping was created with.
    pub fn release(&mut self, address: Address, size: Size) -> MemoryResult<()> {
        let mapping = self.checked_mapping(address, size)?.clone();
        self.mappings.remove(&address);

        match self.unmap_mapping(mapping) {
            Ok(()) => {
                debug!(
                    size,
                    address = format_args!("0x{:x}", address),
                    "Released mapping"
                );
                Ok(())
            }
            Err((mapping, e)) => {
                self.mappings.insert(address, mapping);
                Err(e)
            }
        }
    }

    /// Pin a live mapping against swap; no-op when already pinned
    pub fn pin(&mut self, address: Address, size: Size) -> MemoryResult<()> {
        self.checked_mapping(address, size)?;
        let mapping = self
            .mappings
            .get_mut(&address)
            .ok_or(MemoryError::InvalidPointer(address))?;
        if mapping.pinned {
            return Ok(());
        }

        let ptr = mapping_ptr(address)?;
        // SAFETY: the range is a live mapping owned by this backend.
        unsafe { self.platform.lock(ptr, size) }.map_err(|e| MemoryError::AllocationFailed {
            size,
            reason: format!("mlock failed: {}", e),
        })?;
        mapping.pinned = true;
        Ok(())
    }

    /// Let a live mapping be swapped out; no-op when not pinned
    pub fn unpin(&mut self, address: Address, size: Size) -> MemoryResult<()> {
        self.checked_mapping(address, size)?;
        let mapping = self
            .mappings
            .get_mut(&address)
            .ok_or(MemoryError::InvalidPointer(address))?;
        if !mapping.pinned {
            return Ok(());
        }

        let ptr = mapping_ptr(address)?;
        // SAFETY: the range is a live mapping owned by this backend.
        unsafe { self.platform.unlock(ptr, size) }.map_err(|e| {
            MemoryError::AllocationFailed {
                size,
                reason: format!("munlock failed: {}", e),
            }
        })?;
        mapping.pinned = false;
        Ok(())
    }

    pub fn mapping(&self, address: Address) -> Option<&PageMapping> {
        self.mappings.get(&address)
    }

    /// Outstanding mappings in address order
    pub fn mappings(&self) -> impl Iterator<Item = &PageMapping> {
        self.mappings.values()
    }

    pub fn total_allocated(&self) -> Size {
        self.total_allocated
    }

    /// Live snapshot of free physical memory
    pub fn available(&self) -> Size {
        self.platform.available_physical()
    }

    pub fn page_size(&self) -> Size {
        self.platform.page_size()
    }

    /// Release every outstanding mapping
    pub fn release_all(&mut self) {
        let mappings = std::mem::take(&mut self.mappings);
        let count = mappings.len();

        for (address, mapping) in mappings {
            if let Err((mapping, e)) = self.unmap_mapping(mapping) {
                error!(
                    address = format_args!("0x{:x}", address),
                    error = %e,
                    "Failed to release mapping"
                );
                self.mappings.insert(address, mapping);
            }
        }

        if count > 0 {
            info!(
                released = count - self.mappings.len(),
                remaining = self.mappings.len(),
                "Released page mappings"
            );
        }
    }

    fn checked_mapping(&self, address: Address, size: Size) -> MemoryResult<&PageMapping> {
        let mapping = self.mappings.get(&address).ok_or_else(|| {
            warn!(
                address = format_args!("0x{:x}", address),
                "Address is not mapped by the page backend"
            );
            MemoryError::InvalidPointer(address)
        })?;

        if mapping.size != size {
            return Err(MemoryError::SizeMismatch {
                address,
                expected: mapping.size,
                actual: size,
            });
        }

        Ok(mapping)
    }

    /// Unpin and unmap a mapping already removed from the table
    ///
    /// On failure the mapping is handed back so the caller can keep tracking it.
    fn unmap_mapping(
        &mut self,
        mut mapping: PageMapping,
    ) -> Result<(), (PageMapping, MemoryError)> {
        let ptr = match mapping_ptr(mapping.address) {
            Ok(ptr) => ptr,
            Err(e) => return Err((mapping, e)),
        };

        if mapping.pinned {
            // SAFETY: the range is a live mapping owned by this backend.
            match unsafe { self.platform.unlock(ptr, mapping.size) } {
                Ok(()) => mapping.pinned = false,
                Err(e) => warn!(
                    address = format_args!("0x{:x}", mapping.address),
                    error = %e,
                    "munlock failed, unmapping anyway"
                ),
            }
        }

        // SAFETY: the mapping is no longer tracked, so nothing hands it out.
        if let Err(e) = unsafe { self.platform.unmap(ptr, mapping.size) } {
            let size = mapping.size;
            return Err((
                mapping,
                MemoryError::AllocationFailed {
                    size,
                    reason: format!("munmap failed: {}", e),
                },
            ));
        }

        self.total_allocated -= mapping.size;
        Ok(())
    }
}

fn mapping_ptr(address: Address) -> MemoryResult<NonNull<u8>> {
    NonNull::new(address as *mut u8).ok_or(MemoryError::InvalidPointer(address))
}

impl<P: PlatformMemory> Drop for PageAllocator<P> {
    fn drop(&mut self) {
        if !self.mappings.is_empty() {
            self.release_all();
        }
    }
}

impl<P: PlatformMemory> RegionAllocator for PageAllocator<P> {
    fn kind(&self) -> BackendKind {
        BackendKind::Page
    }

    fn allocate(&mut self, size: Size, tag: &str) -> MemoryResult<Address> {
        PageAllocator::allocate(self, size, tag)
    }

    fn free(&mut self, address: Address) -> MemoryResult<Size> {
        let size = self
            .mapping(address)
            .map(|mapping| mapping.size)
            .ok_or(MemoryError::InvalidPointer(address))?;
        self.release(address, size)?;
        Ok(size)
    }

    fn free_all(&mut self) {
        self.release_all()
    }

    fn total_allocated(&self) -> Size {
        self.total_allocated
    }

    fn available(&self) -> Size {
        PageAllocator::available(self)
    }

    fn is_memory_available(&self, size: Size) -> bool {
        size > 0 && self.available() >= size
    }

    fn regions(&self) -> Vec<MemoryRegion> {
        self.mappings
            .values()
            .map(|m| MemoryRegion::used(m.address, m.size, &m.tag))
            .collect()
    }

    fn stats(&self) -> MemoryStats {
        let available = self.available();
        let total = available.saturating_add(self.total_allocated);
        let usage_percentage = if total == 0 {
            0.0
        } else {
            (self.total_allocated as f64 / total as f64) * 100.0
        };

        MemoryStats {
            backend: BackendKind::Page,
            total_memory: total,
            allocated_memory: self.total_allocated,
            available_memory: available,
            usage_percentage,
            used_regions: self.mappings.len(),
            free_regions: 0,
            largest_free_region: 0,
            fragmentation_ratio: 0.0,
        }
    }
}
