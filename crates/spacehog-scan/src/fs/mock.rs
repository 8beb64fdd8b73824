//! In-memory filesystem for testing.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use spacehog_core::{AccessError, AccessErrorKind};

use super::{FileSystemOperations, Metadata};

#[derive(Debug, Clone, Copy)]
enum MockNode {
    File { size: u64, modified: SystemTime },
    Directory { modified: SystemTime },
    Symlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum MockCall {
    Stat,
    List,
    Remove,
}

/// In-memory [`FileSystemOperations`] with injectable failures.
///
/// Nodes live in a `BTreeMap` behind a [`RwLock`], so listings come back in
/// path order and `remove` works through `&self`. Parent directories are
/// created implicitly when a file is added.
///
/// # Example
///
/// ```
/// use spacehog_scan::{FileSystemOperations, MockFileSystem};
/// use spacehog_core::AccessErrorKind;
/// use std::path::Path;
///
/// let fs = MockFileSystem::new()
///     .with_file("/r/a.txt", 500)
///     .with_file("/r/locked/secret", 10)
///     .fail_list("/r/locked", AccessErrorKind::PermissionDenied);
///
/// assert_eq!(fs.stat(Path::new("/r/a.txt")).unwrap().size, 500);
/// assert!(fs.list(Path::new("/r/locked")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockFileSystem {
    nodes: RwLock<BTreeMap<PathBuf, MockNode>>,
    failures: RwLock<HashMap<(PathBuf, MockCall), AccessErrorKind>>,
}

impl MockFileSystem {
    /// Create an empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory (and its ancestors).
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.insert_dir(&path.into());
        self
    }

    /// Add a file (and its parent directories).
    pub fn with_file(self, path: impl Into<PathBuf>, size: u64) -> Self {
        self.with_file_modified(path, size, UNIX_EPOCH)
    }

    /// Add a file with an explicit modification time.
    pub fn with_file_modified(
        self,
        path: impl Into<PathBuf>,
        size: u64,
        modified: SystemTime,
    ) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.nodes
            .write()
            .insert(path, MockNode::File { size, modified });
        self
    }

    /// Add a symbolic link.
    pub fn with_symlink(self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.nodes.write().insert(path, MockNode::Symlink);
        self
    }

    /// Make `stat` of a path fail.
    pub fn fail_stat(self, path: impl Into<PathBuf>, kind: AccessErrorKind) -> Self {
        self.failures.write().insert((path.into(), MockCall::Stat), kind);
        self
    }

    /// Make `list` of a directory fail.
    pub fn fail_list(self, path: impl Into<PathBuf>, kind: AccessErrorKind) -> Self {
        self.failures.write().insert((path.into(), MockCall::List), kind);
        self
    }

    /// Make `remove` of a path fail.
    pub fn fail_remove(self, path: impl Into<PathBuf>, kind: AccessErrorKind) -> Self {
        self.failures
            .write()
            .insert((path.into(), MockCall::Remove), kind);
        self
    }

    /// Check if a path exists.
    pub fn exists(&self, path: &Path) -> bool {
        self.nodes.read().contains_key(path)
    }

    /// Add a file after construction.
    pub fn add_file(&self, path: impl Into<PathBuf>, size: u64) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.nodes.write().insert(
            path,
            MockNode::File {
                size,
                modified: UNIX_EPOCH,
            },
        );
    }

    fn insert_dir(&self, path: &Path) {
        let mut nodes = self.nodes.write();
        for dir in path.ancestors() {
            if dir.as_os_str().is_empty() {
                break;
            }
            nodes
                .entry(dir.to_path_buf())
                .or_insert(MockNode::Directory {
                    modified: UNIX_EPOCH,
                });
        }
    }

    fn check(&self, path: &Path, call: MockCall) -> Result<(), AccessError> {
        match self.failures.read().get(&(path.to_path_buf(), call)) {
            Some(kind) => Err(AccessError::new(
                *kind,
                format!("injected failure for {}", path.display()),
            )),
            None => Ok(()),
        }
    }

    fn missing(path: &Path) -> AccessError {
        AccessError::not_found(format!("no such path: {}", path.display()))
    }
}

impl FileSystemOperations for MockFileSystem {
    fn stat(&self, path: &Path) -> Result<Metadata, AccessError> {
        self.check(path, MockCall::Stat)?;
        match self.nodes.read().get(path) {
            Some(MockNode::File { size, modified }) => Ok(Metadata::file(*size, *modified)),
            Some(MockNode::Directory { modified }) => Ok(Metadata::directory(*modified)),
            // Dangling: the mock never resolves link targets.
            Some(MockNode::Symlink) | None => Err(Self::missing(path)),
        }
    }

    fn list(&self, path: &Path) -> Result<Vec<PathBuf>, AccessError> {
        self.check(path, MockCall::List)?;
        let nodes = self.nodes.read();
        match nodes.get(path) {
            Some(MockNode::Directory { .. }) => Ok(nodes
                .range(path.to_path_buf()..)
                .skip(1)
                .take_while(|(child, _)| child.starts_with(path))
                .filter(|(child, _)| child.parent() == Some(path))
                .map(|(child, _)| child.clone())
                .collect()),
            Some(_) => Err(AccessError::new(
                AccessErrorKind::Io,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(Self::missing(path)),
        }
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.nodes.read().get(path), Some(MockNode::Symlink))
    }

    fn remove(&self, path: &Path, is_dir: bool) -> Result<(), AccessError> {
        self.check(path, MockCall::Remove)?;
        let mut nodes = self.nodes.write();
        match nodes.get(path) {
            None => Err(Self::missing(path)),
            Some(MockNode::Directory { .. }) if !is_dir => Err(AccessError::new(
                AccessErrorKind::Io,
                format!("is a directory: {}", path.display()),
            )),
            Some(_) => {
                nodes.retain(|p, _| !p.starts_with(path));
                Ok(())
            }
        }
    }
}
