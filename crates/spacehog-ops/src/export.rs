//! JSON export of scan results.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use spacehog_core::{AccessIssues, FileEntry, ScanResult, StorageClass, format_size};
use tracing::info;

use crate::error::ExportError;

/// Top-level export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Summary of the scan.
    pub scan_info: ScanInfo,
    /// Largest files, sorted descending.
    pub largest_files: Vec<ExportedEntry>,
    /// Largest directories, sorted descending.
    pub largest_directories: Vec<ExportedEntry>,
    /// Paths that could not be read.
    pub access_issues: Vec<ExportedIssue>,
}

/// Scan summary block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanInfo {
    /// RFC 3339 export time.
    pub timestamp: String,
    pub scanned_path: String,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    pub files_scanned: u64,
}

/// One file or directory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub path: String,
    pub size_bytes: u64,
    pub size_human: String,
    /// `"local"` or `"remote"`.
    pub storage_type: StorageClass,
}

/// One access issue row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedIssue {
    pub path: String,
    pub error: String,
}

impl From<&FileEntry> for ExportedEntry {
    fn from(entry: &FileEntry) -> Self {
        Self {
            path: entry.path.display().to_string(),
            size_bytes: entry.size,
            size_human: format_size(entry.size),
            storage_type: entry.storage_class,
        }
    }
}

impl ExportDocument {
    /// Build a document from loose parts, stamped with the current time.
    pub fn from_parts(
        scanned_root: &Path,
        files: &[FileEntry],
        dirs: &[FileEntry],
        total_bytes: u64,
        files_scanned: u64,
        access_issues: &AccessIssues,
    ) -> Self {
        Self {
            scan_info: ScanInfo {
                timestamp: Utc::now().to_rfc3339(),
                scanned_path: scanned_root.display().to_string(),
                total_size_bytes: total_bytes,
                total_size_human: format_size(total_bytes),
                files_scanned,
            },
            largest_files: files.iter().map(ExportedEntry::from).collect(),
            largest_directories: dirs.iter().map(ExportedEntry::from).collect(),
            access_issues: access_issues
                .iter()
                .map(|(path, error)| ExportedIssue {
                    path: path.display().to_string(),
                    error: error.to_string(),
                })
                .collect(),
        }
    }

    /// Build a document from a scan result.
    pub fn from_result(result: &ScanResult) -> Self {
        Self::from_parts(
            &result.root,
            &result.files,
            &result.dirs,
            result.total_bytes,
            result.files_scanned,
            &result.access_issues,
        )
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Write `doc` as JSON to `output`.
pub fn write_export(output: &Path, doc: &ExportDocument) -> Result<(), ExportError> {
    let json = doc.to_json()?;
    fs::write(output, json).map_err(|source| ExportError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    info!(path = %output.display(), "results exported");
    Ok(())
}

/// Export a scan to `output`.
pub fn export(
    output: &Path,
    files: &[FileEntry],
    dirs: &[FileEntry],
    scanned_root: &Path,
    total_bytes: u64,
    files_scanned: u64,
    access_issues: &AccessIssues,
) -> Result<ExportDocument, ExportError> {
    let doc = ExportDocument::from_parts(
        scanned_root,
        files,
        dirs,
        total_bytes,
        files_scanned,
        access_issues,
    );
    write_export(output, &doc)?;
    Ok(doc)
}

/// Read an export back.
pub fn read_export(path: &Path) -> Result<ExportDocument, ExportError> {
    let json = fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: PathBuf::from(path),
        source,
    })?;
    ExportDocument::from_json(&json)
}
