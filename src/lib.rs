/*!
 * Native Memory Allocator Library
 *
 * Bounded, tagged native memory for a foreign-language caller, served by a
 * fixed pool with first-fit placement and full coalescing, or by pinned OS
 * page mappings.
 */

pub mod config;
pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use config::AllocatorConfig;
pub use crate::core::types::{Address, Handle, Size, NULL_HANDLE};
pub use memory::{
    global, shutdown_global, BackendKind, MemoryError, MemoryErrorKind, MemoryInfo,
    MemoryPressure, MemoryRegion, MemoryResult, MemoryStats, NativeMemoryManager,
};
pub use monitoring::init_tracing;
