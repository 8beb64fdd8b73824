//! Core types and configuration for spacehog.
//!
//! This crate provides the value types shared by the scanning engine and
//! the session layer: file entries, scan options, progress snapshots,
//! scan outcomes and the error taxonomy.

mod config;
mod entry;
mod error;
mod progress;
mod size;

pub use config::{ScanOptions, ScanOptionsBuilder};
pub use entry::{EntryKind, FileEntry, StorageClass};
pub use error::{AccessError, AccessErrorKind, ScanError};
pub use progress::{AccessIssues, ScanOutcome, ScanProgress, ScanResult};
pub use size::format_size;
