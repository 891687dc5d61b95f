//! Tracing and logging setup shared by binaries and tests.

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() -> bool {
    tracing::init_with(&tracing::LogConfig::from_env())
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat};
