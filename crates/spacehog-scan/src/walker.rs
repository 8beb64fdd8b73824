//! Depth-first filesystem walker.
//!
//! The walker is a plain [`Iterator`]: every call to `next` performs at most
//! one entry's worth of filesystem work (a stat, plus a listing when the
//! entry is a directory). Callers decide how many entries to pull before
//! yielding, and can stop between any two pulls.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use std::vec;

use spacehog_core::{AccessError, AccessIssues, EntryKind, ScanError, ScanOptions};
use tracing::debug;

use crate::fs::FileSystemOperations;

/// A single entry produced by the walk.
///
/// Directories report size 0; their sizes come from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Absolute path.
    pub path: PathBuf,
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
}

/// A directory whose children are being walked.
struct Frame {
    path: PathBuf,
    modified: SystemTime,
    children: vec::IntoIter<PathBuf>,
}

/// Lazy depth-first traversal over a [`FileSystemOperations`] backend.
///
/// Files are yielded as they are reached; a directory is yielded after all
/// of its contents (post-order). Symlinks are never followed and never
/// yielded. Directories whose name matches the skip list are excluded with
/// all their children. Failures are recorded per path and the walk carries
/// on with the next sibling.
pub struct FileSystemWalker {
    fs: Arc<dyn FileSystemOperations>,
    options: Arc<ScanOptions>,
    stack: Vec<Frame>,
    issues: AccessIssues,
    dirs_walked: u64,
}

impl FileSystemWalker {
    /// Start a walk at `root`.
    ///
    /// Fails if the root is not a directory or cannot be listed; these are
    /// the only fatal conditions of a walk.
    pub fn new(
        fs: Arc<dyn FileSystemOperations>,
        options: Arc<ScanOptions>,
        root: &Path,
    ) -> Result<Self, ScanError> {
        let metadata = fs.stat(root).map_err(|_| ScanError::InvalidPath {
            path: root.to_path_buf(),
        })?;
        if !metadata.kind.is_dir() {
            return Err(ScanError::InvalidPath {
                path: root.to_path_buf(),
            });
        }

        let children = fs.list(root).map_err(|source| ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;

        let mut walker = Self {
            fs,
            options,
            stack: Vec::new(),
            issues: AccessIssues::new(),
            dirs_walked: 0,
        };
        walker.push_frame(root.to_path_buf(), metadata.modified, children);
        Ok(walker)
    }

    /// Access issues recorded so far.
    pub fn issues(&self) -> &AccessIssues {
        &self.issues
    }

    /// Take the recorded access issues, leaving an empty map.
    pub fn take_issues(&mut self) -> AccessIssues {
        std::mem::take(&mut self.issues)
    }

    /// Number of directories completed so far.
    pub fn dirs_walked(&self) -> u64 {
        self.dirs_walked
    }

    /// Stop walking `path` and everything beneath it.
    ///
    /// Pending siblings elsewhere are untouched. Pruning the root ends
    /// the walk.
    pub fn prune(&mut self, path: &Path) {
        self.stack.retain(|frame| !frame.path.starts_with(path));
        for frame in &mut self.stack {
            let rest: Vec<PathBuf> = frame
                .children
                .by_ref()
                .filter(|child| !child.starts_with(path))
                .collect();
            frame.children = rest.into_iter();
        }
    }

    /// Check if the walk is exhausted.
    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    fn push_frame(&mut self, path: PathBuf, modified: SystemTime, mut children: Vec<PathBuf>) {
        // Listing order is backend-defined; sort so repeated scans agree.
        children.sort();
        self.stack.push(Frame {
            path,
            modified,
            children: children.into_iter(),
        });
    }

    fn record_issue(&mut self, path: PathBuf, error: AccessError) {
        debug!(path = %path.display(), error = %error, "access issue");
        self.issues.insert(path, error);
    }

    /// Process one child path; returns an entry to yield, if any.
    fn visit(&mut self, path: PathBuf) -> Option<WalkEntry> {
        if self.fs.is_symlink(&path) {
            return None;
        }

        let metadata = match self.fs.stat(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                self.record_issue(path, error);
                return None;
            }
        };

        match metadata.kind {
            EntryKind::File => Some(WalkEntry {
                path,
                kind: EntryKind::File,
                size: metadata.size,
                modified: metadata.modified,
            }),
            EntryKind::Directory => {
                let skipped = path
                    .file_name()
                    .is_some_and(|name| self.options.should_skip(&name.to_string_lossy()));
                if skipped {
                    return None;
                }

                // An unreadable directory is still yielded (with no children)
                // so it counts as visited.
                let children = match self.fs.list(&path) {
                    Ok(children) => children,
                    Err(error) => {
                        self.record_issue(path.clone(), error);
                        Vec::new()
                    }
                };
                self.push_frame(path, metadata.modified, children);
                None
            }
        }
    }
}

impl Iterator for FileSystemWalker {
    type Item = WalkEntry;

    fn next(&mut self) -> Option<WalkEntry> {
        loop {
            let frame = self.stack.last_mut()?;
            match frame.children.next() {
                Some(child) => {
                    if let Some(entry) = self.visit(child) {
                        return Some(entry);
                    }
                }
                None => {
                    let frame = self.stack.pop()?;
                    self.dirs_walked += 1;
                    return Some(WalkEntry {
                        path: frame.path,
                        kind: EntryKind::Directory,
                        size: 0,
                        modified: frame.modified,
                    });
                }
            }
        }
    }
}
