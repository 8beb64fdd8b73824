//! Filesystem access used by the walker and by deletion.
//!
//! Every call is fallible. The scanner never touches `std::fs` directly;
//! it goes through [`FileSystemOperations`] so alternative backends (and
//! the in-memory `MockFileSystem` behind the `mock` feature) can be
//! swapped in.

#[cfg(any(test, feature = "mock"))]
mod mock;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use spacehog_core::{AccessError, EntryKind};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockFileSystem;

/// Metadata the scanner needs about a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// File or directory.
    pub kind: EntryKind,
    /// Apparent size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

impl Metadata {
    /// Metadata for a file.
    pub fn file(size: u64, modified: SystemTime) -> Self {
        Self {
            kind: EntryKind::File,
            size,
            modified,
        }
    }

    /// Metadata for a directory.
    pub fn directory(modified: SystemTime) -> Self {
        Self {
            kind: EntryKind::Directory,
            size: 0,
            modified,
        }
    }
}

/// Low-level filesystem primitives.
pub trait FileSystemOperations: Send + Sync {
    /// Stat a path, following symlinks.
    fn stat(&self, path: &Path) -> Result<Metadata, AccessError>;

    /// List the immediate children of a directory.
    fn list(&self, path: &Path) -> Result<Vec<PathBuf>, AccessError>;

    /// Check if a path is a symbolic link. Failures read as `false`.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Remove a file, or a directory with everything beneath it.
    fn remove(&self, path: &Path, is_dir: bool) -> Result<(), AccessError>;

    /// Resolve a path to its absolute form.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, AccessError> {
        Ok(path.to_path_buf())
    }
}

/// [`FileSystemOperations`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl StdFileSystem {
    /// Create a new std filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystemOperations for StdFileSystem {
    fn stat(&self, path: &Path) -> Result<Metadata, AccessError> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        if metadata.is_dir() {
            Ok(Metadata::directory(modified))
        } else {
            Ok(Metadata::file(metadata.len(), modified))
        }
    }

    fn list(&self, path: &Path) -> Result<Vec<PathBuf>, AccessError> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path)? {
            children.push(entry?.path());
        }
        Ok(children)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn remove(&self, path: &Path, is_dir: bool) -> Result<(), AccessError> {
        if is_dir {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, AccessError> {
        Ok(fs::canonicalize(path)?)
    }
}
