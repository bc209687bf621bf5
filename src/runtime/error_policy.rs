//! # Error Policy
//!
//! The one place that decides what a failed sync cycle means for the process.
//!
//! The binary logs and continues: the next tick retries the whole pipeline.
//! There is no backoff or retry budget.

use crate::observability::metrics;
use crate::sync::SyncError;
use tracing::error;

/// What the scheduler does after a failed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDecision {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the failure and wait for the next tick
    #[default]
    LogAndContinue,
    /// Log the failure and stop scheduling
    StopOnError,
}

impl ErrorPolicy {
    pub fn handle(self, error: &SyncError) -> CycleDecision {
        record_sync_error(error);
        match self {
            ErrorPolicy::LogAndContinue => CycleDecision::Continue,
            ErrorPolicy::StopOnError => CycleDecision::Stop,
        }
    }
}

/// Log a failed cycle and count it
pub fn record_sync_error(error: &SyncError) {
    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "sync.error",
        error.kind = error.kind()
    );
    let _error_guard = error_span.enter();

    error!(error.kind = error.kind(), "sync failed: {}", error);
    metrics::increment_sync_errors(error.kind());
}
