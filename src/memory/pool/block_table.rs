/*!
 * Block Table
 * Address-ordered region metadata for the pool allocator
 */

use crate::core::types::{Address, Size};
use crate::memory::types::MemoryRegion;
use std::collections::BTreeMap;
use thiserror::Error;

/// Aggregate view of the free regions in a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeSummary {
    pub count: usize,
    pub bytes: Size,
    pub largest: Size,
}

/// Structural defect found by [`BlockTable::validate`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableViolation {
    #[error("region keyed at 0x{key:x} records address 0x{address:x}")]
    KeyMismatch { key: Address, address: Address },

    #[error("zero-sized region at 0x{0:x}")]
    EmptyRegion(Address),

    #[error("expected a region at 0x{expected:x}, found 0x{found:x}")]
    Gap { expected: Address, found: Address },

    #[error("region at 0x{address:x} overlaps its predecessor ending at 0x{previous_end:x}")]
    Overlap {
        address: Address,
        previous_end: Address,
    },

    #[error("regions end at 0x{end:x}, pool ends at 0x{pool_end:x}")]
    Coverage { end: Address, pool_end: Address },

    #[error("adjacent free regions at 0x{first:x} and 0x{second:x}")]
    AdjacentFree { first: Address, second: Address },
}

impl TableViolation {
    /// Address at which the defect was found
    pub fn address(&self) -> Address {
        match *self {
            TableViolation::KeyMismatch { key, .. } => key,
            TableViolation::EmptyRegion(address) => address,
            TableViolation::Gap { expected, .. } => expected,
            TableViolation::Overlap { address, .. } => address,
            TableViolation::Coverage { end, .. } => end,
            TableViolation::AdjacentFree { first, .. } => first,
        }
    }
}

/// Maps each region's start address to its metadata
///
/// Pure data structure: placement policy lives in the pool allocator.
/// Iteration is always in address order so first-fit is reproducible.
#[derive(Debug, Default, Clone)]
pub struct BlockTable {
    regions: BTreeMap<Address, MemoryRegion>,
}

impl BlockTable {
    pub fn new() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    /// Table holding one free region covering `[base, base + size)`
    pub fn spanning(base: Address, size: Size) -> Self {
        let mut table = Self::new();
        table.insert(MemoryRegion::free(base, size));
        table
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, address: Address) -> Option<&MemoryRegion> {
        self.regions.get(&address)
    }

    pub fn get_mut(&mut self, address: Address) -> Option<&mut MemoryRegion> {
        self.regions.get_mut(&address)
    }

    pub fn insert(&mut self, region: MemoryRegion) -> Option<MemoryRegion> {
        self.regions.insert(region.address, region)
    }

    pub fn remove(&mut self, address: Address) -> Option<MemoryRegion> {
        self.regions.remove(&address)
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Regions in ascending address order
    pub fn iter(&self) -> impl Iterator<Item = &MemoryRegion> {
        self.regions.values()
    }

    /// Lowest-addressed free region of at least `size` bytes
    pub fn first_fit(&self, size: Size) -> Option<Address> {
        self.regions
            .values()
            .find(|region| !region.used && region.size >= size)
            .map(|region| region.address)
    }

    /// Region beginning exactly where the region at `address` ends
    pub fn successor(&self, address: Address) -> Option<&MemoryRegion> {
        let region = self.regions.get(&address)?;
        self.regions.get(&region.end())
    }

    /// Start of the first free region whose successor is also free
    pub fn adjacent_free_pair(&self) -> Option<Address> {
        self.regions
            .values()
            .filter(|region| !region.used)
            .find(|region| {
                self.regions
                    .get(&region.end())
                    .map_or(false, |next| !next.used)
            })
            .map(|region| region.address)
    }

    /// Sum of used region sizes
    pub fn used_bytes(&self) -> Size {
        self.regions
            .values()
            .filter(|region| region.used)
            .map(|region| region.size)
            .sum()
    }

    pub fn used_count(&self) -> usize {
        self.regions.values().filter(|region| region.used).count()
    }

    pub fn free_summary(&self) -> FreeSummary {
        self.regions
            .values()
            .filter(|region| !region.used)
            .fold(FreeSummary::default(), |mut summary, region| {
                summary.count += 1;
                summary.bytes += region.size;
                summary.largest = summary.largest.max(region.size);
                summary
            })
    }

    /// Check that the table partitions `[base, base + total)` exactly and
    /// holds no two adjacent free regions
    pub fn validate(&self, base: Address, total: Size) -> Result<(), TableViolation> {
        let mut cursor = base;
        let mut previous_free: Option<Address> = None;

        for (&key, region) in &self.regions {
            if key != region.address {
                return Err(TableViolation::KeyMismatch {
                    key,
                    address: region.address,
                });
            }
            if region.size == 0 {
                return Err(TableViolation::EmptyRegion(key));
            }
            if key > cursor {
                return Err(TableViolation::Gap {
                    expected: cursor,
                    found: key,
                });
            }
            if key < cursor {
                return Err(TableViolation::Overlap {
                    address: key,
                    previous_end: cursor,
                });
            }
            if !region.used {
                if let Some(first) = previous_free {
                    return Err(TableViolation::AdjacentFree { first, second: key });
                }
                previous_free = Some(key);
            } else {
                previous_free = None;
            }
            cursor = region.end();
        }

        let pool_end = base + total;
        if cursor != pool_end {
            return Err(TableViolation::Coverage {
                end: cursor,
                pool_end,
            });
        }

        Ok(())
    }
}
