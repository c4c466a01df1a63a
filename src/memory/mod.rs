/*!
 * Memory Module
 * Pool and page allocation behind one thread-safe facade
 */

pub mod bridge;
pub mod global;
pub mod manager;
pub mod page;
pub mod pool;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use global::{global, shutdown_global};
pub use manager::NativeMemoryManager;
pub use page::{PageAllocator, PlatformMemory, SystemMemory};
pub use pool::{BlockTable, PoolAllocator};
pub use traits::*;
pub use types::*;
