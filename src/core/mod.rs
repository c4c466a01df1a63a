/*!
 * Core Module
 * Fundamental types and limits shared by every backend
 */

pub mod limits;
pub mod types;

// Re-export for convenience
pub use types::*;
