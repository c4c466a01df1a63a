/*!
 * Memory Types
 * Common types for region tracking, statistics and error reporting
 */

use crate::core::limits::{
    PRESSURE_CRITICAL_THRESHOLD, PRESSURE_HIGH_THRESHOLD, PRESSURE_MEDIUM_THRESHOLD,
};
use crate::core::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Allocation of {size} bytes failed: {reason}")]
    #[diagnostic(
        code(memory::allocation_failed),
        help("The backing memory could not be obtained or pinned. The allocator is still usable.")
    )]
    AllocationFailed { size: Size, reason: String },

    #[error("Out of memory: requested {requested} bytes, available {available} bytes (largest free region {largest_free} bytes)")]
    #[diagnostic(
        code(memory::out_of_memory),
        help("Free an outstanding region and retry, or defragment if free space is scattered.")
    )]
    OutOfMemory {
        requested: Size,
        available: Size,
        largest_free: Size,
    },

    #[error("Invalid memory address: 0x{0:x}")]
    #[diagnostic(
        code(memory::invalid_pointer),
        help("The address was never handed out by this allocator or has already been freed.")
    )]
    InvalidPointer(Address),

    #[error("Memory pool not initialized")]
    #[diagnostic(
        code(memory::not_initialized),
        help("Call initialize_pool before allocating from the pool backend.")
    )]
    NotInitialized,

    #[error("Invalid allocation size: {0} bytes")]
    #[diagnostic(code(memory::invalid_size), help("Requested sizes must be non-zero."))]
    InvalidSize(Size),

    #[error("Size mismatch at 0x{address:x}: mapping holds {expected} bytes, caller passed {actual}")]
    #[diagnostic(
        code(memory::size_mismatch),
        help("Release a mapping with the exact size it was allocated with.")
    )]
    SizeMismatch {
        address: Address,
        expected: Size,
        actual: Size,
    },

    #[error("Memory corruption detected at 0x{address:x}: {detail}")]
    #[diagnostic(
        code(memory::corruption_detected),
        help("The region table no longer partitions the pool. This is an allocator bug.")
    )]
    CorruptionDetected { address: Address, detail: String },

    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    #[diagnostic(code(memory::unsupported), help("Select the backend that provides this operation."))]
    Unsupported {
        operation: &'static str,
        backend: BackendKind,
    },
}

/// Fieldless classification of [`MemoryError`] for boundary adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryErrorKind {
    AllocationError,
    OutOfMemory,
    InvalidPointer,
    NotInitialized,
    InvalidSize,
    Corruption,
    Unsupported,
}

impl MemoryError {
    pub fn kind(&self) -> MemoryErrorKind {
        match self {
            MemoryError::AllocationFailed { .. } => MemoryErrorKind::AllocationError,
            MemoryError::OutOfMemory { .. } => MemoryErrorKind::OutOfMemory,
            MemoryError::InvalidPointer(_) | MemoryError::SizeMismatch { .. } => {
                MemoryErrorKind::InvalidPointer
            }
            MemoryError::NotInitialized => MemoryErrorKind::NotInitialized,
            MemoryError::InvalidSize(_) => MemoryErrorKind::InvalidSize,
            MemoryError::CorruptionDetected { .. } => MemoryErrorKind::Corruption,
            MemoryError::Unsupported { .. } => MemoryErrorKind::Unsupported,
        }
    }

    /// Whether the caller may succeed by freeing memory and retrying
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MemoryError::OutOfMemory { .. })
    }
}

/// Allocation strategy behind the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One contiguous buffer carved into tracked regions
    #[default]
    Pool,
    /// One pinned OS mapping per allocation
    Page,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BackendKind::Pool => write!(f, "pool"),
            BackendKind::Page => write!(f, "page"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pool" => Ok(BackendKind::Pool),
            "page" | "mmap" => Ok(BackendKind::Page),
            other => Err(format!("unknown allocator backend '{}'", other)),
        }
    }
}

/// Tracked region metadata
///
/// Identity is the start address. The tag is diagnostic only and never
/// influences placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub address: Address,
    pub size: Size,
    pub tag: String,
    pub used: bool,
}

impl MemoryRegion {
    pub fn free(address: Address, size: Size) -> Self {
        Self {
            address,
            size,
            tag: String::new(),
            used: false,
        }
    }

    pub fn used(address: Address, size: Size, tag: &str) -> Self {
        Self {
            address,
            size,
            tag: tag.to_string(),
            used: true,
        }
    }

    /// One past the last byte of the region
    #[inline]
    pub fn end(&self) -> Address {
        self.address + self.size
    }

    pub fn release(&mut self) {
        self.used = false;
        self.tag.clear();
    }
}

/// Memory statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub backend: BackendKind,
    /// Pool size, or live physical memory for the page backend
    pub total_memory: Size,
    pub allocated_memory: Size,
    pub available_memory: Size,
    pub usage_percentage: f64,
    pub used_regions: usize,
    pub free_regions: usize,
    pub largest_free_region: Size,
    pub fragmentation_ratio: f64,
}

impl MemoryStats {
    pub fn memory_pressure(&self) -> MemoryPressure {
        MemoryPressure::from_ratio(self.usage_percentage / 100.0)
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    pub fn from_ratio(usage_ratio: f64) -> Self {
        if usage_ratio >= PRESSURE_CRITICAL_THRESHOLD {
            MemoryPressure::Critical
        } else if usage_ratio >= PRESSURE_HIGH_THRESHOLD {
            MemoryPressure::High
        } else if usage_ratio >= PRESSURE_MEDIUM_THRESHOLD {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Outstanding OS mapping owned by the page backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMapping {
    pub address: Address,
    pub size: Size,
    pub tag: String,
    pub pinned: bool,
}
