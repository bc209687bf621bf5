//! # Sync Errors
//!
//! Failures of a single sync cycle. None of these stop the process; the
//! scheduler's error policy decides what happens next.

use crate::provider::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no file in {} matches '{pattern}'", directory.display())]
    CandidateNotFound { directory: PathBuf, pattern: String },

    #[error("no file in the directory forms a valid key pair with {}", candidate.display())]
    PairNotFound { candidate: PathBuf },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Short label used in logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Io { .. } => "io",
            SyncError::CandidateNotFound { .. } => "candidate_not_found",
            SyncError::PairNotFound { .. } => "pair_not_found",
            SyncError::Store(_) => "store",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}
