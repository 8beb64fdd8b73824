//! Ancestor-chain directory size accumulation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use spacehog_core::{FileEntry, StorageClass};

/// How many directories above the scan root also accumulate sizes.
pub const ANCESTOR_LEVELS: usize = 2;

#[derive(Debug, Clone, Copy)]
struct DirTotal {
    bytes: u64,
    storage_class: StorageClass,
    first_seen: u64,
}

/// Running per-directory totals for one scan.
///
/// Every file adds its size to each directory from its parent up to the
/// root (and up to [`ANCESTOR_LEVELS`] beyond it), so the totals are a
/// correct partial answer at any point in the walk regardless of the order
/// in which files and directory completions arrive.
#[derive(Debug)]
pub struct DirectorySizeAggregator {
    root: PathBuf,
    root_depth: usize,
    totals: HashMap<PathBuf, DirTotal>,
    modified: HashMap<PathBuf, SystemTime>,
    next_seq: u64,
}

impl DirectorySizeAggregator {
    /// Create an empty aggregator for a scan rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_depth = root.components().count();
        Self {
            root,
            root_depth,
            totals: HashMap::new(),
            modified: HashMap::new(),
            next_seq: 0,
        }
    }

    /// The scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a file's size to all of its tracked ancestors.
    ///
    /// Files outside the root are ignored.
    pub fn record_file(&mut self, path: &Path, size: u64, storage_class: StorageClass) {
        if !path.starts_with(&self.root) || path == self.root {
            return;
        }

        let below_root = path.components().count() - self.root_depth;
        // Never count the empty path or step past the filesystem root.
        let above_root = ANCESTOR_LEVELS.min(self.root_depth.saturating_sub(1));

        for dir in path.ancestors().skip(1).take(below_root + above_root) {
            match self.totals.get_mut(dir) {
                Some(total) => {
                    total.bytes = total.bytes.saturating_add(size);
                    total.storage_class = total.storage_class.merge(storage_class);
                }
                None => {
                    let first_seen = self.next_seq;
                    self.next_seq += 1;
                    self.totals.insert(
                        dir.to_path_buf(),
                        DirTotal {
                            bytes: size,
                            storage_class,
                            first_seen,
                        },
                    );
                }
            }
        }
    }

    /// Remember a directory's modification time for the entries it produces.
    pub fn record_directory(&mut self, path: &Path, modified: SystemTime) {
        self.modified.insert(path.to_path_buf(), modified);
    }

    /// Accumulated size and class of a directory.
    pub fn size_of(&self, path: &Path) -> Option<(u64, StorageClass)> {
        self.totals
            .get(path)
            .map(|total| (total.bytes, total.storage_class))
    }

    /// Drop `path` and every directory beneath it. Ancestors keep their
    /// totals. Returns how many directories were dropped.
    pub fn forget_within(&mut self, path: &Path) -> usize {
        let before = self.totals.len();
        self.totals.retain(|dir, _| !dir.starts_with(path));
        self.modified.retain(|dir, _| !dir.starts_with(path));
        before - self.totals.len()
    }

    /// Number of directories with a total.
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Check if no file has been recorded.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Iterate over `(path, bytes, storage_class)` in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, u64, StorageClass)> {
        self.totals
            .iter()
            .map(|(path, total)| (path.as_path(), total.bytes, total.storage_class))
    }

    /// The `limit` largest directories, sorted descending.
    ///
    /// Full pass over all totals: O(D log D). Callers run it on a cadence,
    /// not per file. Equal sizes keep first-recorded order.
    pub fn largest(&self, limit: usize) -> Vec<FileEntry> {
        if limit == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(&PathBuf, &DirTotal)> = self
            .totals
            .iter()
            .filter(|(path, _)| self.is_reported(path))
            .collect();
        ranked.sort_unstable_by(|(_, a), (_, b)| {
            b.bytes.cmp(&a.bytes).then(a.first_seen.cmp(&b.first_seen))
        });
        ranked.truncate(limit);

        ranked
            .into_iter()
            .map(|(path, total)| {
                let modified = self.modified.get(path).copied().unwrap_or(UNIX_EPOCH);
                FileEntry::new(path.clone(), total.bytes, modified, total.storage_class)
            })
            .collect()
    }

    /// Root, its descendants, and at most [`ANCESTOR_LEVELS`] ancestors.
    fn is_reported(&self, path: &Path) -> bool {
        if path.starts_with(&self.root) {
            return true;
        }
        self.root.starts_with(path)
            && self.root_depth - path.components().count() <= ANCESTOR_LEVELS
    }
}
