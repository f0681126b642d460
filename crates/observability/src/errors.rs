//! Non-fatal error reporting.
//!
//! Components that must keep going after a failure (bootstrap seeding,
//! post-start hooks) hand the error to an [`ErrorSink`] instead of returning it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Records recoverable errors without propagating them.
pub trait ErrorSink: Send + Sync {
    fn handle_error(&self, err: &anyhow::Error);
}

impl<S> ErrorSink for Arc<S>
where
    S: ErrorSink + ?Sized,
{
    fn handle_error(&self, err: &anyhow::Error) {
        (**self).handle_error(err)
    }
}

/// Default sink: logs at `error` level and counts.
#[derive(Debug, Default)]
pub struct LoggingErrorSink {
    handled: AtomicU64,
}

impl LoggingErrorSink {
    pub const fn new() -> Self {
        Self {
            handled: AtomicU64::new(0),
        }
    }

    /// Number of errors handled so far.
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }
}

impl ErrorSink for LoggingErrorSink {
    fn handle_error(&self, err: &anyhow::Error) {
        self.handled.fetch_add(1, Ordering::Relaxed);
        tracing::error!(error = %format!("{err:#}"), "unhandled error");
    }
}

static PROCESS_SINK: LoggingErrorSink = LoggingErrorSink::new();

/// Report a recoverable error to the process-wide sink.
pub fn handle_error(err: impl Into<anyhow::Error>) {
    PROCESS_SINK.handle_error(&err.into());
}

/// The process-wide sink behind [`handle_error`].
pub fn process_sink() -> &'static LoggingErrorSink {
    &PROCESS_SINK
}

/// Sink that keeps rendered errors in memory (tests/dev).
#[derive(Debug, Default)]
pub struct CollectingErrorSink {
    errors: Mutex<Vec<String>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for CollectingErrorSink {
    fn handle_error(&self, err: &anyhow::Error) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.push(format!("{err:#}"));
        }
    }
}
