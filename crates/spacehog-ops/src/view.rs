//! Presentation-time filtering of the largest-directories list.
//!
//! Filtering only decides what is shown; stored aggregates are untouched.

use std::path::{Component, Path, PathBuf};

use spacehog_core::FileEntry;

/// Ancestors further above the root than this are never shown.
pub const MAX_ANCESTOR_LEVELS: usize = 2;

/// Relative size difference under which an ancestor counts as a duplicate
/// of the root.
pub const DUPLICATE_TOLERANCE: f64 = 0.01;

/// Decides which directory rows are worth showing for a scan root.
#[derive(Debug, Clone)]
pub struct ViewFilter {
    root: PathBuf,
    root_size: Option<u64>,
}

impl ViewFilter {
    /// Create a filter for `root`, whose displayed size is taken from
    /// `dirs` if present.
    pub fn new(root: impl Into<PathBuf>, dirs: &[FileEntry]) -> Self {
        let root = root.into();
        let root_size = dirs.iter().find(|d| d.path == root).map(|d| d.size);
        Self { root, root_size }
    }

    /// Check if a directory row should be shown.
    pub fn keeps(&self, dir: &FileEntry) -> bool {
        let path = dir.path.as_path();
        if path == self.root {
            return true;
        }
        if is_top_level(path) {
            return false;
        }
        if self.root.starts_with(path) {
            let levels_above = depth(&self.root) - depth(path);
            if levels_above > MAX_ANCESTOR_LEVELS {
                return false;
            }
            if self.duplicates_root(dir.size) {
                return false;
            }
        }
        true
    }

    /// Keep showable rows, at most `limit` of them, order preserved.
    pub fn apply<'a>(
        &self,
        dirs: impl IntoIterator<Item = &'a FileEntry>,
        limit: usize,
    ) -> Vec<FileEntry> {
        dirs.into_iter()
            .filter(|dir| self.keeps(dir))
            .take(limit)
            .cloned()
            .collect()
    }

    fn duplicates_root(&self, size: u64) -> bool {
        match self.root_size {
            Some(root_size) if root_size > 0 => {
                (size.abs_diff(root_size) as f64) / (root_size as f64) < DUPLICATE_TOLERANCE
            }
            _ => false,
        }
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// `/` itself or a directory directly beneath it.
fn is_top_level(path: &Path) -> bool {
    let mut components = path.components();
    matches!(components.next(), Some(Component::RootDir)) && components.count() <= 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use spacehog_core::StorageClass;
    use std::time::SystemTime;

    fn dir(path: &str, size: u64) -> FileEntry {
        FileEntry::new(path, size, SystemTime::UNIX_EPOCH, StorageClass::Local)
    }

    #[test]
    fn test_root_and_descendants_kept() {
        let dirs = [dir("/home/me/r", 1000), dir("/home/me/r/sub", 1000)];
        let filter = ViewFilter::new("/home/me/r", &dirs);
        assert!(filter.keeps(&dirs[0]));
        assert!(filter.keeps(&dirs[1]));
    }

    #[test]
    fn test_ancestor_within_one_percent_suppressed() {
        let dirs = [
            dir("/a/b/c/r", 10_000),
            dir("/a/b/c", 10_050),
            dir("/a/b", 20_000),
        ];
        let filter = ViewFilter::new("/a/b/c/r", &dirs);
        assert!(!filter.keeps(&dirs[1]));
        assert!(filter.keeps(&dirs[2]));
    }

    #[test]
    fn test_far_ancestors_suppressed() {
        let dirs = [dir("/a/b/c/d/r", 10), dir("/a/b/c", 5_000), dir("/a/b", 9_000)];
        let filter = ViewFilter::new("/a/b/c/d/r", &dirs);
        assert!(filter.keeps(&dirs[1]));
        assert!(!filter.keeps(&dirs[2]));
    }

    #[test]
    fn test_filesystem_root_and_top_level() {
        let dirs = [dir("/home/me", 10), dir("/home", 500), dir("/", 900)];
        let filter = ViewFilter::new("/home/me", &dirs);
        assert!(!filter.keeps(&dirs[1]));
        assert!(!filter.keeps(&dirs[2]));

        let scanning_slash = ViewFilter::new("/", &dirs);
        assert!(scanning_slash.keeps(&dirs[2]));

        let scanning_home = ViewFilter::new("/home", &dirs);
        assert!(scanning_home.keeps(&dirs[1]));
    }

    #[test]
    fn test_apply_limits_after_filtering() {
        let dirs = [
            dir("/", 900),
            dir("/x/r", 300),
            dir("/x/r/a", 200),
            dir("/x/r/b", 100),
        ];
        let shown = ViewFilter::new("/x/r", &dirs).apply(&dirs, 2);
        let paths: Vec<_> = shown.iter().map(|d| d.path.to_str().unwrap()).collect();
        assert_eq!(paths, vec!["/x/r", "/x/r/a"]);
    }
}
