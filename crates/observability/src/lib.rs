//! Tracing, logging and non-fatal error reporting (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Process-wide sink for recoverable errors.
pub mod errors;

pub use errors::{handle_error, process_sink, CollectingErrorSink, ErrorSink, LoggingErrorSink};
