//! Progress snapshots and scan outcomes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::error::{AccessError, ScanError};

/// Per-path access failures recorded during a scan.
pub type AccessIssues = BTreeMap<PathBuf, AccessError>;

/// Point-in-time view of a running scan.
///
/// Each snapshot is complete on its own; consumers replace their state
/// rather than merging diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Progress estimate in `[0, 1]`, non-decreasing across snapshots.
    pub fraction: f64,
    /// Largest files seen so far, sorted descending by size.
    pub top_files: Vec<FileEntry>,
    /// Largest directories seen so far, sorted descending by size.
    pub top_dirs: Vec<FileEntry>,
    /// Number of files read so far.
    pub files_scanned: u64,
    /// Bytes of all files read so far.
    pub total_bytes: u64,
}

impl ScanProgress {
    /// Create an empty progress snapshot.
    pub fn new() -> Self {
        Self {
            fraction: 0.0,
            top_files: Vec::new(),
            top_dirs: Vec::new(),
            files_scanned: 0,
            total_bytes: 0,
        }
    }

    /// Check if this is the terminal snapshot of a completed scan.
    pub fn is_complete(&self) -> bool {
        self.fraction >= 1.0
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Final (or partial, when interrupted) result of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root path that was scanned.
    pub root: PathBuf,
    /// Largest files, sorted descending by size.
    pub files: Vec<FileEntry>,
    /// Largest directories, sorted descending by size.
    pub dirs: Vec<FileEntry>,
    /// Bytes of all files read.
    pub total_bytes: u64,
    /// Number of files read.
    pub files_scanned: u64,
    /// Paths that could not be read.
    pub access_issues: AccessIssues,
    /// Wall time spent scanning.
    pub scan_duration: Duration,
}

impl ScanResult {
    /// Check if there were any access issues.
    pub fn has_access_issues(&self) -> bool {
        !self.access_issues.is_empty()
    }

    /// Aggregated size of a listed directory.
    pub fn dir_size(&self, path: &std::path::Path) -> Option<u64> {
        self.dirs.iter().find(|d| d.path == path).map(|d| d.size)
    }
}

/// How a scan ended.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The whole tree was walked.
    Completed(ScanResult),
    /// A stop was requested; the result holds whatever was gathered.
    Interrupted(ScanResult),
}

impl ScanOutcome {
    /// Borrow the result regardless of how the scan ended.
    pub fn result(&self) -> &ScanResult {
        match self {
            Self::Completed(result) | Self::Interrupted(result) => result,
        }
    }

    /// Take the result regardless of how the scan ended.
    pub fn into_result(self) -> ScanResult {
        match self {
            Self::Completed(result) | Self::Interrupted(result) => result,
        }
    }

    /// Check if the scan was interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted(_))
    }

    /// Take the result only if the scan completed.
    pub fn into_completed(self) -> Result<ScanResult, ScanError> {
        match self {
            Self::Completed(result) => Ok(result),
            Self::Interrupted(_) => Err(ScanError::Interrupted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_result() -> ScanResult {
        ScanResult {
            root: PathBuf::from("/r"),
            files: Vec::new(),
            dirs: Vec::new(),
            total_bytes: 0,
            files_scanned: 0,
            access_issues: AccessIssues::new(),
            scan_duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_progress_default() {
        let progress = ScanProgress::default();
        assert_eq!(progress.files_scanned, 0);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_outcome_accessors() {
        let done = ScanOutcome::Completed(empty_result());
        assert!(!done.is_interrupted());
        assert!(done.into_completed().is_ok());

        let partial = ScanOutcome::Interrupted(empty_result());
        assert!(partial.is_interrupted());
        assert_eq!(partial.result().root, PathBuf::from("/r"));
        assert!(matches!(partial.into_completed(), Err(ScanError::Interrupted)));
    }
}
