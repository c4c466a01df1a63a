/*!
 * Pool Allocator
 *
 * One contiguous backing buffer carved into tracked regions.
 *
 * ## Algorithm
 *
 * - **First-fit**: free regions are searched in address order and the
 *   lowest-addressed region large enough wins
 * - **Splitting**: a matched region is split only when it exceeds the request
 *   by more than the split threshold; otherwise the whole region is handed
 *   out so no unusable slivers are produced
 * - **Coalescing**: every free merges adjacent free regions until none remain,
 *   so no two neighbouring regions are ever both free between operations
 *
 * All operations are O(n) in the number of regions. Allocations are expected
 * to be few and coarse.
 */

mod block_table;
mod buffer;

pub use block_table::{BlockTable, FreeSummary, TableViolation};

use super::traits::RegionAllocator;
use super::types::{
    BackendKind, MemoryError, MemoryPressure, MemoryRegion, MemoryResult, MemoryStats,
};
use crate::core::limits::{FRAGMENTATION_UNIT, MIN_SPLIT_REMAINDER};
use crate::core::types::{Address, Size};
use buffer::PoolBuffer;
use tracing::{debug, info, warn};

/// Fixed-size pool of tracked regions
pub struct PoolAllocator {
    buffer: PoolBuffer,
    table: BlockTable,
    total_allocated: Size,
    split_threshold: Size,
}

impl PoolAllocator {
    /// Acquire a fresh pool of `pool_size` bytes
    pub fn new(pool_size: Size) -> MemoryResult<Self> {
        Self::with_split_threshold(pool_size, MIN_SPLIT_REMAINDER)
    }

    /// Acquire a pool with a custom minimum split remainder
    pub fn with_split_threshold(pool_size: Size, split_threshold: Size) -> MemoryResult<Self> {
        let buffer = PoolBuffer::allocate(pool_size)?;
        let table = BlockTable::spanning(buffer.base(), buffer.len());

        info!(
            pool_size,
            base = format_args!("0x{:x}", buffer.base()),
            split_threshold,
            "Memory pool initialized"
        );

        Ok(Self {
            buffer,
            table,
            total_allocated: 0,
            split_threshold,
        })
    }

    pub fn base_address(&self) -> Address {
        self.buffer.base()
    }

    pub fn total_size(&self) -> Size {
        self.buffer.len()
    }

    pub fn split_threshold(&self) -> Size {
        self.split_threshold
    }

    /// Read-only view of the region table
    pub fn table(&self) -> &BlockTable {
        &self.table
    }

    /// Whether `address` lies inside the backing buffer
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base_address() && address < self.base_address() + self.total_size()
    }

    pub fn allocate(&mut self, size: Size, tag: &str) -> MemoryResult<Address> {
        if size == 0 {
            return Err(MemoryError::InvalidSize(size));
        }

        let address = match self.table.first_fit(size) {
            Some(address) if size <= self.total_size() => address,
            _ => {
                let free = self.table.free_summary();
                warn!(
                    requested = size,
                    available = self.available(),
                    largest_free = free.largest,
                    "No free region large enough"
                );
                return Err(MemoryError::OutOfMemory {
                    requested: size,
                    available: self.available(),
                    largest_free: free.largest,
                });
            }
        };

        let region = self
            .table
            .get_mut(address)
            .ok_or(MemoryError::InvalidPointer(address))?;

        let remainder = region.size - size;
        let split = remainder > self.split_threshold;
        if split {
            region.size = size;
        }
        region.used = true;
        region.tag = tag.to_string();
        let granted = region.size;

        if split {
            self.table
                .insert(MemoryRegion::free(address + size, remainder));
        }

        self.total_allocated += granted;
        debug_assert_eq!(self.table.used_bytes(), self.total_allocated);

        let usage_ratio = self.total_allocated as f64 / self.total_size() as f64;
        match MemoryPressure::from_ratio(usage_ratio) {
            level @ (MemoryPressure::High | MemoryPressure::Critical) => {
                warn!(
                    %level,
                    size = granted,
                    address = format_args!("0x{:x}", address),
                    tag,
                    allocated = self.total_allocated,
                    total = self.total_size(),
                    "Memory pressure after allocation"
                );
            }
            _ => {
                debug!(
                    size = granted,
                    requested = size,
                    split,
                    address = format_args!("0x{:x}", address),
                    tag,
                    "Allocated region"
                );
            }
        }

        Ok(address)
    }

    /// Release the region starting at `address`, returning its size
    pub fn free(&mut self, address: Address) -> MemoryResult<Size> {
        let region = match self.table.get_mut(address) {
            Some(region) if region.used => region,
            _ => {
                warn!(
                    address = format_args!("0x{:x}", address),
                    "Attempted to free invalid or already freed address"
                );
                return Err(MemoryError::InvalidPointer(address));
            }
        };

        let size = region.size;
        let tag = std::mem::take(&mut region.tag);
        region.release();
        self.total_allocated -= size;

        let merges = self.coalesce();
        debug!(
            size,
            address = format_args!("0x{:x}", address),
            tag = tag.as_str(),
            merges,
            "Freed region"
        );

        Ok(size)
    }

    /// Merge every pair of free regions whose addresses touch
    ///
    /// Terminates because each merge removes one region from the table.
    pub fn coalesce(&mut self) -> usize {
        let mut merges = 0;

        while let Some(address) = self.table.adjacent_free_pair() {
            let Some(next_address) = self.table.get(address).map(MemoryRegion::end) else {
                break;
            };
            let Some(next) = self.table.remove(next_address) else {
                break;
            };
            if let Some(region) = self.table.get_mut(address) {
                region.size += next.size;
            }
            merges += 1;
        }

        if merges > 0 {
            debug!(merges, regions = self.table.len(), "Coalesced adjacent free regions");
        }

        merges
    }

    /// Free regions per kilobyte of free space
    pub fn fragmentation_ratio(&self) -> f64 {
        let free = self.table.free_summary();
        if free.count == 0 || free.bytes == 0 {
            return 0.0;
        }
        free.count as f64 / (free.bytes as f64 / FRAGMENTATION_UNIT)
    }

    pub fn total_allocated(&self) -> Size {
        self.total_allocated
    }

    pub fn available(&self) -> Size {
        self.total_size() - self.total_allocated
    }

    /// Whether a free region of at least `size` bytes exists
    pub fn is_memory_available(&self, size: Size) -> bool {
        size > 0 && self.table.first_fit(size).is_some()
    }

    /// Release every region and return to a single free region
    pub fn reset(&mut self) {
        let released = self.table.used_count();
        self.table = BlockTable::spanning(self.base_address(), self.total_size());
        self.total_allocated = 0;
        info!(released, pool_size = self.total_size(), "Memory pool reset");
    }

    /// Check the partition, accounting and coalescing invariants
    pub fn validate(&self) -> Result<(), TableViolation> {
        self.table.validate(self.base_address(), self.total_size())
    }

    pub fn stats(&self) -> MemoryStats {
        let free = self.table.free_summary();
        MemoryStats {
            backend: BackendKind::Pool,
            total_memory: self.total_size(),
            allocated_memory: self.total_allocated,
            available_memory: self.available(),
            usage_percentage: (self.total_allocated as f64 / self.total_size() as f64) * 100.0,
            used_regions: self.table.used_count(),
            free_regions: free.count,
            largest_free_region: free.largest,
            fragmentation_ratio: self.fragmentation_ratio(),
        }
    }
}

impl Drop for PoolAllocator {
    fn drop(&mut self) {
        info!(
            pool_size = self.total_size(),
            outstanding = self.total_allocated,
            "Memory pool released"
        );
    }
}

impl RegionAllocator for PoolAllocator {
    fn kind(&self) -> BackendKind {
        BackendKind::Pool
    }

    fn allocate(&mut self, size: Size, tag: &str) -> MemoryResult<Address> {
        PoolAllocator::allocate(self, size, tag)
    }

    fn free(&mut self, address: Address) -> MemoryResult<Size> {
        PoolAllocator::free(self, address)
    }

    fn free_all(&mut self) {
        self.reset()
    }

    fn total_allocated(&self) -> Size {
        PoolAllocator::total_allocated(self)
    }

    fn available(&self) -> Size {
        PoolAllocator::available(self)
    }

    fn is_memory_available(&self, size: Size) -> bool {
        PoolAllocator::is_memory_available(self, size)
    }

    fn fragmentation_ratio(&self) -> f64 {
        PoolAllocator::fragmentation_ratio(self)
    }

    fn defragment(&mut self) -> usize {
        self.coalesce()
    }

    fn validate(&self) -> MemoryResult<()> {
        PoolAllocator::validate(self).map_err(|violation| MemoryError::CorruptionDetected {
            address: violation.address(),
            detail: violation.to_string(),
        })?;
        if self.table.used_bytes() != self.total_allocated {
            return Err(MemoryError::CorruptionDetected {
                address: self.base_address(),
                detail: format!(
                    "used regions hold {} bytes, counter says {}",
                    self.table.used_bytes(),
                    self.total_allocated
                ),
            });
        }
        Ok(())
    }

    fn regions(&self) -> Vec<MemoryRegion> {
        self.table.iter().cloned().collect()
    }

    fn stats(&self) -> MemoryStats {
        PoolAllocator::stats(self)
    }
}
