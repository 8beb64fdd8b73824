//! File and directory entry types.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Where the bytes of an entry are believed to live.
///
/// This is a path heuristic, not a filesystem-verified property.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageClass {
    /// Stored on the local disk.
    #[default]
    Local,
    /// Synced from remote storage.
    Remote,
}

impl StorageClass {
    /// Combine two classes; remote wins.
    pub fn merge(self, other: StorageClass) -> StorageClass {
        if self.is_remote() || other.is_remote() {
            StorageClass::Remote
        } else {
            StorageClass::Local
        }
    }

    /// Check if this is remote storage.
    pub fn is_remote(self) -> bool {
        matches!(self, StorageClass::Remote)
    }
}

/// Kind of entry produced by a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file (or anything that is not a directory).
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    /// Check if this is a directory.
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Directory)
    }

    /// Check if this is a file.
    pub fn is_file(self) -> bool {
        matches!(self, EntryKind::File)
    }
}

/// A file or directory with its (aggregate) size.
///
/// Entries are immutable values: a recomputed size produces a new entry via
/// [`FileEntry::with_size`] so snapshots handed out earlier never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// Size in bytes (aggregate for directories).
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Storage class heuristic.
    pub storage_class: StorageClass,
}

impl FileEntry {
    /// Create a new entry.
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        modified: SystemTime,
        storage_class: StorageClass,
    ) -> Self {
        Self {
            path: path.into(),
            size,
            modified,
            storage_class,
        }
    }

    /// Copy of this entry with a different size.
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            path: self.path.clone(),
            size,
            modified: self.modified,
            storage_class: self.storage_class,
        }
    }

    /// Check if this entry is classified as remote.
    pub fn is_remote(&self) -> bool {
        self.storage_class.is_remote()
    }

    /// Check if this entry is `path` or lies beneath it.
    pub fn is_within(&self, path: &Path) -> bool {
        self.path.starts_with(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_merge() {
        assert_eq!(StorageClass::Local.merge(StorageClass::Local), StorageClass::Local);
        assert_eq!(StorageClass::Local.merge(StorageClass::Remote), StorageClass::Remote);
        assert_eq!(StorageClass::Remote.merge(StorageClass::Local), StorageClass::Remote);
    }

    #[test]
    fn test_storage_class_strings() {
        assert_eq!(StorageClass::Local.to_string(), "local");
        assert_eq!(StorageClass::Remote.as_ref(), "remote");
        assert_eq!("remote".parse::<StorageClass>().unwrap(), StorageClass::Remote);
    }

    #[test]
    fn test_with_size_leaves_original_untouched() {
        let entry = FileEntry::new("/data/a", 100, SystemTime::UNIX_EPOCH, StorageClass::Remote);
        let resized = entry.with_size(40);

        assert_eq!(entry.size, 100);
        assert_eq!(resized.size, 40);
        assert_eq!(resized.path, entry.path);
        assert!(resized.is_remote());
    }

    #[test]
    fn test_is_within() {
        let entry = FileEntry::new("/data/a/b.txt", 1, SystemTime::UNIX_EPOCH, StorageClass::Local);
        assert!(entry.is_within(Path::new("/data")));
        assert!(entry.is_within(Path::new("/data/a/b.txt")));
        assert!(!entry.is_within(Path::new("/dat")));
    }
}
