//! Paths removed from disk while a scan is running.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared queue of removed paths, drained by the running cursor.
///
/// A front end pushes a path after deleting it; the cursor drops the path
/// and everything beneath it from its live state at the start of its next
/// pull. Ancestor totals are left alone.
#[derive(Debug, Clone, Default)]
pub struct PendingRemovals {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl PendingRemovals {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a removed path.
    pub fn push(&self, path: impl AsRef<Path>) {
        self.paths.lock().push(path.as_ref().to_path_buf());
    }

    /// Take every queued path, oldest first.
    pub fn take(&self) -> Vec<PathBuf> {
        std::mem::take(&mut *self.paths.lock())
    }

    /// Drop anything queued.
    pub fn clear(&self) {
        self.paths.lock().clear();
    }

    /// Number of queued paths.
    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }
}
