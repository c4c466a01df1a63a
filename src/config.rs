/*!
 * Allocator Configuration
 *
 * Backend selection and pool sizing, from code or the environment.
 */

use crate::core::limits::{ENV_BACKEND, ENV_POOL_SIZE, ENV_SPLIT_THRESHOLD, MIN_SPLIT_REMAINDER};
use crate::core::types::Size;
use crate::memory::BackendKind;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for [`crate::NativeMemoryManager`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    /// Which backend serves allocations
    pub backend: BackendKind,

    /// Pool size in bytes; when set the pool is initialized at construction
    pub pool_size: Option<Size>,

    /// Minimum remainder worth splitting off a free region (default: 32B)
    pub split_threshold: Size,
}

impl AllocatorConfig {
    /// Pool backend with an eagerly initialized pool
    pub fn pool(pool_size: Size) -> Self {
        Self {
            backend: BackendKind::Pool,
            pool_size: Some(pool_size),
            ..Self::default()
        }
    }

    /// Direct OS-page backend
    pub fn page() -> Self {
        Self {
            backend: BackendKind::Page,
            pool_size: None,
            ..Self::default()
        }
    }

    pub fn with_split_threshold(mut self, split_threshold: Size) -> Self {
        self.split_threshold = split_threshold;
        self
    }

    /// Read configuration from the process environment
    ///
    /// Environment variables:
    /// - NATIVE_MEM_BACKEND: `pool` or `page` (default: pool)
    /// - NATIVE_MEM_POOL_SIZE: pool size in bytes (default: unset, pool
    ///   must be initialized explicitly)
    /// - NATIVE_MEM_SPLIT_THRESHOLD: minimum split remainder in bytes
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BACKEND) {
            match value.parse::<BackendKind>() {
                Ok(backend) => config.backend = backend,
                Err(e) => warn!(key = ENV_BACKEND, value = %value, error = %e, "Ignoring invalid backend"),
            }
        }

        if let Some(value) = lookup(ENV_POOL_SIZE) {
            match value.trim().parse::<Size>() {
                Ok(size) if size > 0 => config.pool_size = Some(size),
                _ => warn!(key = ENV_POOL_SIZE, value = %value, "Ignoring invalid pool size"),
            }
        }

        if let Some(value) = lookup(ENV_SPLIT_THRESHOLD) {
            match value.trim().parse::<Size>() {
                Ok(threshold) => config.split_threshold = threshold,
                Err(e) => warn!(
                    key = ENV_SPLIT_THRESHOLD,
                    value = %value,
                    error = %e,
                    "Ignoring invalid split threshold"
                ),
            }
        }

        config
    }
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Pool,
            pool_size: None,
            split_threshold: MIN_SPLIT_REMAINDER,
        }
    }
}
