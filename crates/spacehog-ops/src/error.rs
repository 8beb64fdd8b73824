//! Error types for session operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A hide or delete that failed for one path.
///
/// Failures are per item and never disturb the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{path}: {message}")]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors writing or reading a JSON export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The file could not be written or read.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be (de)serialized.
    #[error("Invalid export document: {0}")]
    Json(#[from] serde_json::Error),
}
