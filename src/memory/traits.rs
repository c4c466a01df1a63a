/*!
 * Memory Traits
 * Backend and statistics abstractions
 */

use super::types::*;
use crate::core::types::{Address, Size};

/// Allocation backend interface
///
/// Implementations own every byte they hand out. A returned address stays
/// valid until the matching `free`, after which the backend may reuse it.
pub trait RegionAllocator: Send {
    /// Which strategy this backend implements
    fn kind(&self) -> BackendKind;

    /// Allocate `size` bytes carrying a diagnostic tag
    fn allocate(&mut self, size: Size, tag: &str) -> MemoryResult<Address>;

    /// Release the region starting at `address`, returning its size
    fn free(&mut self, address: Address) -> MemoryResult<Size>;

    /// Release every outstanding region
    fn free_all(&mut self);

    /// Bytes currently handed out
    fn total_allocated(&self) -> Size;

    /// Bytes that could still be handed out
    fn available(&self) -> Size;

    /// Whether a request of `size` bytes could currently succeed
    fn is_memory_available(&self, size: Size) -> bool;

    /// Free regions per kilobyte of free space
    fn fragmentation_ratio(&self) -> f64 {
        0.0
    }

    /// Merge adjacent free regions, returning the number of merges
    fn defragment(&mut self) -> usize {
        0
    }

    /// Check the backend's structural invariants
    fn validate(&self) -> MemoryResult<()> {
        Ok(())
    }

    /// Address-ordered snapshot of tracked regions
    fn regions(&self) -> Vec<MemoryRegion>;

    /// Snapshot of current statistics
    fn stats(&self) -> MemoryStats;
}

/// Memory statistics provider
pub trait MemoryInfo: Send + Sync {
    /// Get overall memory statistics
    fn stats(&self) -> MemoryResult<MemoryStats>;

    /// Get memory info as (total, used, available)
    fn info(&self) -> MemoryResult<(Size, Size, Size)> {
        let stats = self.stats()?;
        Ok((
            stats.total_memory,
            stats.allocated_memory,
            stats.available_memory,
        ))
    }

    /// Get memory pressure level
    fn pressure(&self) -> MemoryResult<MemoryPressure> {
        Ok(self.stats()?.memory_pressure())
    }
}
