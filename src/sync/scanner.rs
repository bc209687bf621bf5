//! # Directory Scanner
//!
//! Finds the candidate file in the certificate directory.
//!
//! The listing is not recursive and keeps the order the filesystem returns.
//! That order is not sorted and can differ between platforms, so when several
//! files match the pattern the one picked is not guaranteed to be stable.

use crate::sync::error::SyncError;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One directory listing with the candidate picked from it
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// First entry whose full path matches the pattern
    pub candidate: PathBuf,
    /// Every entry of the directory, in listing order, candidate included
    pub entries: Vec<PathBuf>,
}

/// List the direct entries of `directory` as full paths, in listing order
pub fn list_directory(directory: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(directory).to_path_buf();
            SyncError::io(path, e.into())
        })?;
        entries.push(directory.join(entry.file_name()));
    }

    Ok(entries)
}

/// First entry whose full path matches `pattern`
pub fn first_match<'a>(entries: &'a [PathBuf], pattern: &Regex) -> Option<&'a PathBuf> {
    entries
        .iter()
        .find(|path| pattern.is_match(&path.to_string_lossy()))
}

/// List `directory` and pick the first entry matching `pattern`
///
/// # Errors
///
/// [`SyncError::Io`] if the directory cannot be read,
/// [`SyncError::CandidateNotFound`] if nothing matches.
pub fn find_candidate(directory: &Path, pattern: &Regex) -> Result<ScanResult, SyncError> {
    let entries = list_directory(directory)?;

    let candidate = first_match(&entries, pattern)
        .cloned()
        .ok_or_else(|| SyncError::CandidateNotFound {
            directory: directory.to_path_buf(),
            pattern: pattern.as_str().to_string(),
        })?;

    debug!("found file {} to sync", candidate.display());

    Ok(ScanResult { candidate, entries })
}
