/*!
 * Native Memory Allocator - Diagnostic Entry Point
 *
 * Builds the process-wide manager from the environment, logs its usage and
 * prints a JSON statistics snapshot to stdout.
 */

use native_mem::{global, init_tracing, shutdown_global, AllocatorConfig};
use std::error::Error;
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = AllocatorConfig::from_env();
    info!(
        backend = %config.backend,
        pool_size = ?config.pool_size,
        split_threshold = config.split_threshold,
        "Native memory allocator starting"
    );

    let manager = global();
    manager.log_usage();

    let report = match manager.stats() {
        Ok(stats) => serde_json::json!({
            "config": config,
            "stats": stats,
            "pressure": stats.memory_pressure().to_string(),
        }),
        Err(e) => serde_json::json!({
            "config": config,
            "error": e.to_string(),
            "kind": e.kind(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    shutdown_global();
    Ok(())
}
