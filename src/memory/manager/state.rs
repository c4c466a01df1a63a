/*!
 * Allocator State
 * The active backend guarded by the facade lock
 */

use crate::core::types::Size;
use crate::memory::page::PageAllocator;
use crate::memory::pool::PoolAllocator;
use crate::memory::traits::RegionAllocator;
use crate::memory::types::{BackendKind, MemoryError, MemoryResult};

/// Backend selected by configuration
pub(super) enum Backend {
    /// `None` until `initialize_pool` succeeds and after shutdown
    Pool(Option<PoolAllocator>),
    Page(PageAllocator),
}

pub(super) struct AllocatorState {
    pub(super) backend: Backend,
    pub(super) split_threshold: Size,
}

impl AllocatorState {
    pub(super) fn new(kind: BackendKind, split_threshold: Size) -> Self {
        let backend = match kind {
            BackendKind::Pool => Backend::Pool(None),
            BackendKind::Page => Backend::Page(PageAllocator::new()),
        };
        Self {
            backend,
            split_threshold,
        }
    }

    pub(super) fn kind(&self) -> BackendKind {
        match self.backend {
            Backend::Pool(_) => BackendKind::Pool,
            Backend::Page(_) => BackendKind::Page,
        }
    }

    pub(super) fn active(&self) -> MemoryResult<&dyn RegionAllocator> {
        match &self.backend {
            Backend::Pool(Some(pool)) => Ok(pool),
            Backend::Pool(None) => Err(MemoryError::NotInitialized),
            Backend::Page(pages) => Ok(pages),
        }
    }

    pub(super) fn active_mut(&mut self) -> MemoryResult<&mut dyn RegionAllocator> {
        match &mut self.backend {
            Backend::Pool(Some(pool)) => Ok(pool),
            Backend::Pool(None) => Err(MemoryError::NotInitialized),
            Backend::Page(pages) => Ok(pages),
        }
    }

    pub(super) fn pages_mut(&mut self, operation: &'static str) -> MemoryResult<&mut PageAllocator> {
        match &mut self.backend {
            Backend::Page(pages) => Ok(pages),
            Backend::Pool(_) => Err(MemoryError::Unsupported {
                operation,
                backend: BackendKind::Pool,
            }),
        }
    }
}
