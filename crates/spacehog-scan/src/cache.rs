//! TTL memo of directory sizes.
//!
//! Purely an optimization layer: losing or ignoring its contents never
//! changes what a scan reports, only what a lookup costs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use spacehog_core::StorageClass;

/// A cached directory size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryCacheEntry {
    /// Aggregated size in bytes.
    pub size: u64,
    /// Aggregated storage class.
    pub storage_class: StorageClass,
    /// When the entry was last set.
    pub timestamp: Instant,
    /// Cleared by invalidation or lazy expiry.
    pub valid: bool,
}

impl DirectoryCacheEntry {
    fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        self.valid && now.saturating_duration_since(self.timestamp) < ttl
    }
}

/// Thread-safe directory size cache keyed by absolute path.
///
/// One lock guards the whole map. Expired entries are detected on read and
/// marked invalid; [`cleanup`](Self::cleanup) removes them.
#[derive(Debug)]
pub struct DirectorySizeCache {
    entries: Mutex<HashMap<PathBuf, DirectoryCacheEntry>>,
    ttl: Duration,
}

impl DirectorySizeCache {
    /// Default entry lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

    /// Create a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    /// Create a cache whose entries live for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a live entry.
    pub fn get(&self, path: &Path) -> Option<(u64, StorageClass)> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(path)?;
        if entry.is_live(Instant::now(), self.ttl) {
            Some((entry.size, entry.storage_class))
        } else {
            entry.valid = false;
            None
        }
    }

    /// Store a size, replacing whatever was there.
    pub fn set(&self, path: impl Into<PathBuf>, size: u64, storage_class: StorageClass) {
        self.entries.lock().insert(
            path.into(),
            DirectoryCacheEntry {
                size,
                storage_class,
                timestamp: Instant::now(),
                valid: true,
            },
        );
    }

    /// Store several sizes under one lock acquisition.
    pub fn set_many<I>(&self, items: I)
    where
        I: IntoIterator<Item = (PathBuf, u64, StorageClass)>,
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        for (path, size, storage_class) in items {
            entries.insert(
                path,
                DirectoryCacheEntry {
                    size,
                    storage_class,
                    timestamp: now,
                    valid: true,
                },
            );
        }
    }

    /// Mark one entry invalid. Returns `true` if it existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        match self.entries.lock().get_mut(path) {
            Some(entry) => {
                entry.valid = false;
                true
            }
            None => false,
        }
    }

    /// Mark every entry whose path contains `pattern` invalid.
    ///
    /// Returns the number of entries touched.
    pub fn invalidate_by_pattern(&self, pattern: &str) -> usize {
        let mut count = 0;
        for (path, entry) in self.entries.lock().iter_mut() {
            if path.to_string_lossy().contains(pattern) {
                entry.valid = false;
                count += 1;
            }
        }
        count
    }

    /// Remove invalid and expired entries. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now, self.ttl));
        before - entries.len()
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DirectorySizeCache {
    fn default() -> Self {
        Self::new()
    }
}
