/*!
 * Global Manager
 * Process-wide allocator created on first use and torn down at exit
 */

use super::manager::NativeMemoryManager;
use crate::config::AllocatorConfig;
use std::sync::OnceLock;
use tracing::error;

static GLOBAL_MANAGER: OnceLock<NativeMemoryManager> = OnceLock::new();

/// Process-wide manager, configured from the environment on first use
///
/// If eager pool initialization fails the manager is still created, left
/// uninitialized, so callers see `NotInitialized` instead of a panic.
pub fn global() -> &'static NativeMemoryManager {
    GLOBAL_MANAGER.get_or_init(|| {
        let config = AllocatorConfig::from_env();
        let manager = match NativeMemoryManager::new(config.clone()) {
            Ok(manager) => manager,
            Err(e) => {
                error!(error = %e, "Eager pool initialization failed");
                let fallback = AllocatorConfig {
                    pool_size: None,
                    ..config
                };
                match NativeMemoryManager::new(fallback) {
                    Ok(manager) => manager,
                    Err(_) => NativeMemoryManager::with_pages(),
                }
            }
        };
        register_exit_hook();
        manager
    })
}

/// Release the global manager's backing memory if it was ever created
///
/// Safe to call any number of times.
pub fn shutdown_global() {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.shutdown();
    }
}

#[cfg(unix)]
extern "C" fn shutdown_at_exit() {
    shutdown_global();
}

#[cfg(unix)]
fn register_exit_hook() {
    // SAFETY: the hook is a plain extern "C" fn with no captured state.
    if unsafe { libc::atexit(shutdown_at_exit) } != 0 {
        error!("Failed to register exit hook for memory manager");
    }
}

#[cfg(not(unix))]
fn register_exit_hook() {}
