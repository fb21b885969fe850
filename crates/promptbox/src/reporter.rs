//! Where a run reports its failures and diagnostics.
//!
//! A [`Survey`](crate::Survey) never returns run failures; it hands them to a
//! [`Reporter`] so the run can finish and still be reconciled afterwards.

use std::sync::{Mutex, PoisonError};

/// Sink for failures and diagnostic logs.
pub trait Reporter: Send + Sync {
    /// Record a failure of the run.
    fn error(&self, message: &str);

    /// Record diagnostic output.
    fn log(&self, message: &str);
}

/// Forwards everything to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn log(&self, message: &str) {
        tracing::debug!("{message}");
    }
}

/// Keeps failures and logs for later assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    errors: Mutex<Vec<String>>,
    logs: Mutex<Vec<String>>,
}

impl RecordingReporter {
    /// Empty reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Failures reported so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Logs reported so far.
    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether any failure was reported.
    pub fn has_errors(&self) -> bool {
        !self
            .errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Reporter for RecordingReporter {
    fn error(&self, message: &str) {
        tracing::error!("{message}");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn log(&self, message: &str) {
        tracing::debug!("{message}");
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
