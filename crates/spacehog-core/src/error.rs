//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Errors that stop a scan from starting or completing.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root path does not exist or is not a directory.
    #[error("Invalid path: {path} is not a directory")]
    InvalidPath { path: PathBuf },

    /// Root directory exists but cannot be listed.
    #[error("Cannot read scan root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: AccessError,
    },

    /// Scan was stopped before it completed.
    #[error("Scan interrupted")]
    Interrupted,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Classification of a per-path access failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum AccessErrorKind {
    /// Permission was denied.
    #[strum(to_string = "Permission denied")]
    PermissionDenied,
    /// Path vanished or never existed.
    #[strum(to_string = "Not found")]
    NotFound,
    /// Any other I/O failure.
    #[strum(to_string = "I/O error")]
    Io,
}

impl AccessErrorKind {
    /// Classify an I/O error.
    pub fn classify(error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io,
        }
    }
}

/// A failure to stat, list or remove a single path.
///
/// Access errors are always recovered at the narrowest scope: the walker
/// records them against the failing path and moves on to its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct AccessError {
    /// Classified kind.
    pub kind: AccessErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl AccessError {
    /// Create a new access error.
    pub fn new(kind: AccessErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a permission denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::PermissionDenied, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AccessErrorKind::NotFound, message)
    }
}

impl From<std::io::Error> for AccessError {
    fn from(error: std::io::Error) -> Self {
        Self::new(AccessErrorKind::classify(&error), error.to_string())
    }
}
