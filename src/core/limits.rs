/*!
 * Allocator Limits and Constants
 *
 * Centralized location for sizing constants and thresholds.
 * Values are grouped by concern so call sites never carry magic numbers.
 */

// =============================================================================
// POOL SIZING
// =============================================================================

/// Default pool size (1GB)
/// Used when a pool is requested without an explicit size
pub const DEFAULT_POOL_SIZE: usize = 1024 * 1024 * 1024;

/// Minimum remainder (32 bytes) worth splitting off a free region
/// A matched region is split only when it exceeds the request by more than
/// this; otherwise the whole region is handed out to avoid slivers.
pub const MIN_SPLIT_REMAINDER: usize = 32;

/// Alignment of the pool's backing buffer (one cache line)
pub const POOL_BUFFER_ALIGN: usize = 64;

// =============================================================================
// FRAGMENTATION & PRESSURE
// =============================================================================

/// Unit of free space used by the fragmentation ratio (free regions per KB)
pub const FRAGMENTATION_UNIT: f64 = 1024.0;

/// Usage ratio at which memory pressure is reported as medium
pub const PRESSURE_MEDIUM_THRESHOLD: f64 = 0.60;

/// Usage ratio at which memory pressure is reported as high
pub const PRESSURE_HIGH_THRESHOLD: f64 = 0.80;

/// Usage ratio at which memory pressure is reported as critical
pub const PRESSURE_CRITICAL_THRESHOLD: f64 = 0.95;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Selects the backend (`pool` or `page`)
pub const ENV_BACKEND: &str = "NATIVE_MEM_BACKEND";

/// Pool size in bytes; when set the pool is initialized eagerly
pub const ENV_POOL_SIZE: &str = "NATIVE_MEM_POOL_SIZE";

/// Overrides [`MIN_SPLIT_REMAINDER`]
pub const ENV_SPLIT_THRESHOLD: &str = "NATIVE_MEM_SPLIT_THRESHOLD";

/// Enables JSON trace output when set to `1` or `true`
pub const ENV_TRACE_JSON: &str = "NATIVE_MEM_TRACE_JSON";
