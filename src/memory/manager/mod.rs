/*!
 * Native Memory Manager
 *
 * Single entry point over whichever backend is configured.
 *
 * ## Locking
 *
 * One `parking_lot::Mutex` covers the whole backend state (region table and
 * counters, or the mapping table). Every public operation holds it for its
 * full duration, so no caller ever observes a table mid-mutation. Guards are
 * released on every exit path, including errors.
 *
 * The page backend's system calls run under the same lock, which makes them
 * a serialization point under heavy page traffic.
 *
 * ## Handles
 *
 * Allocations return an opaque [`Handle`] wide enough to carry a native
 * address. A handle is a borrowed view of memory the manager still owns and
 * stays valid only until it is freed.
 */

mod allocator;
mod state;
mod stats;

use crate::config::AllocatorConfig;
use crate::core::types::Size;
use crate::memory::pool::PoolAllocator;
use crate::memory::types::{BackendKind, MemoryError, MemoryResult};
use parking_lot::Mutex;
use state::{AllocatorState, Backend};
use std::sync::Arc;
use tracing::{info, warn};

/// Thread-safe allocator facade
///
/// Cloning is cheap and every clone shares the same backend.
#[derive(Clone)]
pub struct NativeMemoryManager {
    state: Arc<Mutex<AllocatorState>>,
}

impl NativeMemoryManager {
    /// Build a manager from configuration
    ///
    /// The pool backend starts uninitialized unless `pool_size` is set.
    pub fn new(config: AllocatorConfig) -> MemoryResult<Self> {
        let manager = Self {
            state: Arc::new(Mutex::new(AllocatorState::new(
                config.backend,
                config.split_threshold,
            ))),
        };

        info!(
            backend = %config.backend,
            pool_size = ?config.pool_size,
            split_threshold = config.split_threshold,
            "Native memory manager created"
        );

        if let (BackendKind::Pool, Some(pool_size)) = (config.backend, config.pool_size) {
            manager.initialize_pool(pool_size)?;
        }

        Ok(manager)
    }

    /// Pool backend with an initialized pool of `pool_size` bytes
    pub fn with_pool(pool_size: Size) -> MemoryResult<Self> {
        Self::new(AllocatorConfig::pool(pool_size))
    }

    /// Direct OS-page backend
    pub fn with_pages() -> Self {
        Self {
            state: Arc::new(Mutex::new(AllocatorState::new(
                BackendKind::Page,
                AllocatorConfig::default().split_threshold,
            ))),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.state.lock().kind()
    }

    /// Whether allocations can currently be served
    pub fn is_initialized(&self) -> bool {
        self.state.lock().active().is_ok()
    }

    /// Discard any existing pool and acquire a fresh one of `pool_size` bytes
    ///
    /// Every live handle into the previous pool becomes invalid. On failure
    /// the manager is left uninitialized, never half-initialized.
    pub fn initialize_pool(&self, pool_size: Size) -> MemoryResult<()> {
        let mut state = self.state.lock();
        let split_threshold = state.split_threshold;

        let Backend::Pool(slot) = &mut state.backend else {
            return Err(MemoryError::Unsupported {
                operation: "initialize_pool",
                backend: BackendKind::Page,
            });
        };

        if let Some(previous) = slot.take() {
            if previous.total_allocated() > 0 {
                warn!(
                    outstanding = previous.total_allocated(),
                    "Reinitializing pool with live allocations"
                );
            }
        }

        *slot = Some(PoolAllocator::with_split_threshold(pool_size, split_threshold)?);
        Ok(())
    }

    /// Release all backing memory
    ///
    /// Idempotent. The pool backend returns to the uninitialized state; the
    /// page backend unmaps every outstanding mapping.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        match &mut state.backend {
            Backend::Pool(slot) => {
                if slot.take().is_some() {
                    info!("Native memory manager shut down");
                }
            }
            Backend::Page(pages) => {
                if pages.mappings().next().is_some() {
                    pages.release_all();
                    info!("Native memory manager shut down");
                }
            }
        }
    }
}
