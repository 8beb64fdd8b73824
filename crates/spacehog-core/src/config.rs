//! Scan configuration types.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::entry::StorageClass;
use crate::error::ScanError;

/// Largest accepted value for `max_files` / `max_dirs`.
const MAX_LIST_LEN: usize = 1_000_000;

/// Configuration for a single scan invocation.
///
/// Built once and read-only for the scan's lifetime.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Number of largest files to keep.
    #[builder(default = "10")]
    #[serde(default = "default_list_len")]
    pub max_files: usize,

    /// Number of largest directories to keep.
    #[builder(default = "10")]
    #[serde(default = "default_list_len")]
    pub max_dirs: usize,

    /// Directory names excluded (with their children) by exact match.
    #[builder(default = "default_skip_dir_names()")]
    #[serde(default = "default_skip_dir_names")]
    pub skip_dir_names: BTreeSet<CompactString>,

    /// Files beneath this directory are classified as remote.
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub remote_storage_base: Option<PathBuf>,

    /// Files whose path contains this marker are classified as remote.
    #[builder(default = "default_remote_marker()")]
    #[serde(default = "default_remote_marker")]
    pub remote_marker: Option<CompactString>,

    /// Rows a front end should show for files (None = `max_files`).
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub display_max_files: Option<usize>,

    /// Rows a front end should show for directories (None = `max_dirs`).
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub display_max_dirs: Option<usize>,

    /// Lifetime of directory size cache entries.
    #[builder(default = "default_cache_ttl()")]
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: Duration,
}

fn default_list_len() -> usize {
    10
}

fn default_skip_dir_names() -> BTreeSet<CompactString> {
    [".Trash", "System Volume Information"]
        .into_iter()
        .map(CompactString::from)
        .collect()
}

fn default_remote_marker() -> Option<CompactString> {
    Some(CompactString::from("Mobile Documents"))
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(600)
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_files.is_some_and(|n| n > MAX_LIST_LEN) {
            return Err(format!("max_files cannot exceed {MAX_LIST_LEN}"));
        }
        if self.max_dirs.is_some_and(|n| n > MAX_LIST_LEN) {
            return Err(format!("max_dirs cannot exceed {MAX_LIST_LEN}"));
        }
        if self.cache_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err("cache_ttl must be positive".to_string());
        }
        Ok(())
    }
}

impl From<ScanOptionsBuilderError> for ScanError {
    fn from(error: ScanOptionsBuilderError) -> Self {
        ScanError::InvalidConfig {
            message: error.to_string(),
        }
    }
}

impl ScanOptions {
    /// Create a new scan options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Options with the given list lengths and defaults elsewhere.
    pub fn new(max_files: usize, max_dirs: usize) -> Self {
        Self {
            max_files,
            max_dirs,
            ..Self::default()
        }
    }

    /// Check if a directory with this name is excluded.
    pub fn should_skip(&self, name: &str) -> bool {
        self.skip_dir_names.contains(name)
    }

    /// Classify a file path as local or remote.
    pub fn storage_class_for(&self, path: &Path) -> StorageClass {
        let under_base = self
            .remote_storage_base
            .as_deref()
            .is_some_and(|base| path != base && path.starts_with(base));

        let has_marker = self
            .remote_marker
            .as_deref()
            .filter(|marker| !marker.is_empty())
            .is_some_and(|marker| path.to_string_lossy().contains(marker));

        if under_base || has_marker {
            StorageClass::Remote
        } else {
            StorageClass::Local
        }
    }

    /// Number of file rows to display.
    pub fn display_files_limit(&self) -> usize {
        self.display_max_files.unwrap_or(self.max_files)
    }

    /// Number of directory rows to display.
    pub fn display_dirs_limit(&self) -> usize {
        self.display_max_dirs.unwrap_or(self.max_dirs)
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_files: default_list_len(),
            max_dirs: default_list_len(),
            skip_dir_names: default_skip_dir_names(),
            remote_storage_base: None,
            remote_marker: default_remote_marker(),
            display_max_files: None,
            display_max_dirs: None,
            cache_ttl: default_cache_ttl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ScanOptions::builder()
            .max_files(5usize)
            .max_dirs(3usize)
            .remote_storage_base("/Users/me/Library/Mobile Documents")
            .build()
            .unwrap();

        assert_eq!(options.max_files, 5);
        assert_eq!(options.max_dirs, 3);
        assert!(options.should_skip(".Trash"));
        assert_eq!(
            options.remote_storage_base,
            Some(PathBuf::from("/Users/me/Library/Mobile Documents"))
        );
    }

    #[test]
    fn test_builder_rejects_huge_lists() {
        let result = ScanOptions::builder().max_files(MAX_LIST_LEN + 1).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_error_is_invalid_config() {
        let err: ScanError = ScanOptions::builder()
            .max_dirs(MAX_LIST_LEN + 1)
            .build()
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            ScanError::InvalidConfig { message } if message.contains("max_dirs")
        ));
    }

    #[test]
    fn test_should_skip_is_exact() {
        let options = ScanOptions::default();
        assert!(options.should_skip("System Volume Information"));
        assert!(!options.should_skip(".Trash-1000"));
        assert!(!options.should_skip("trash"));
    }

    #[test]
    fn test_storage_class_by_base() {
        let options = ScanOptions::builder()
            .remote_storage_base("/cloud")
            .remote_marker(None::<CompactString>)
            .build()
            .unwrap();

        assert_eq!(options.storage_class_for(Path::new("/cloud/a.txt")), StorageClass::Remote);
        assert_eq!(options.storage_class_for(Path::new("/cloud")), StorageClass::Local);
        assert_eq!(options.storage_class_for(Path::new("/cloudy/a.txt")), StorageClass::Local);
    }

    #[test]
    fn test_storage_class_by_marker() {
        let options = ScanOptions::default();
        assert_eq!(
            options.storage_class_for(Path::new("/Users/me/Library/Mobile Documents/x.pdf")),
            StorageClass::Remote
        );
        assert_eq!(options.storage_class_for(Path::new("/Users/me/x.pdf")), StorageClass::Local);
    }

    #[test]
    fn test_display_limits_fall_back() {
        let mut options = ScanOptions::new(7, 4);
        assert_eq!(options.display_files_limit(), 7);
        assert_eq!(options.display_dirs_limit(), 4);

        options.display_max_files = Some(20);
        assert_eq!(options.display_files_limit(), 20);
    }
}
