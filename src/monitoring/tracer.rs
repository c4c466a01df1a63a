/*!
 * Structured Tracing
 * Subscriber setup for allocator events using the tracing crate
 */

use crate::core::limits::ENV_TRACE_JSON;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Whether the given flag value asks for JSON output
fn is_enabled(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True")
}

/// Whether NATIVE_MEM_TRACE_JSON requests JSON output
pub fn json_output_requested() -> bool {
    std::env::var(ENV_TRACE_JSON)
        .map(|v| is_enabled(&v))
        .unwrap_or(false)
}

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - NATIVE_MEM_TRACE_JSON: Enable JSON output (default: false)
///
/// A host process that already installed a subscriber keeps it; this call
/// then does nothing.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json_output_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .compact(),
            )
            .try_init()
    };

    match result {
        Ok(()) => info!(json = json_output_requested(), "Structured tracing initialized"),
        Err(e) => debug!(error = %e, "Tracing subscriber already installed"),
    }
}
