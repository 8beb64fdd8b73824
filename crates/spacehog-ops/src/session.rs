//! Scan session state for a front end.
//!
//! A [`ScanSession`] holds what the user is looking at: the latest lists,
//! totals and access issues, plus the hide/delete bookkeeping layered on
//! top. Snapshots from the scanner replace the lists wholesale; hidden
//! subtractions and deleted paths are re-applied to every snapshot until a
//! rescan.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use spacehog_core::{AccessIssues, FileEntry, ScanError, ScanOptions, ScanOutcome, ScanProgress};
use spacehog_scan::{
    DirectorySizeCache, FileSystemOperations, PendingRemovals, ScanCoordinator, ScanEvent,
};
use tracing::{debug, info, warn};

use crate::confirm::Confirm;
use crate::error::{ExportError, OperationError};
use crate::export::{ExportDocument, write_export};
use crate::view::ViewFilter;

/// How a delete removes data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Remove for good.
    #[default]
    Permanent,
    /// Move to the platform trash.
    Trash,
}

/// What happened to one delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Removed from disk and from the lists.
    Deleted {
        /// Last known size of what was removed.
        bytes_freed: u64,
    },
    /// The confirmation step said no.
    Declined,
    /// Removal failed; nothing else changed.
    Failed(OperationError),
}

impl DeleteStatus {
    /// Check if the path was removed.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }
}

/// Live view of one scan root.
pub struct ScanSession {
    root: PathBuf,
    options: ScanOptions,
    fs: Arc<dyn FileSystemOperations>,
    cache: Option<Arc<DirectorySizeCache>>,
    removals: Option<PendingRemovals>,
    files: Vec<FileEntry>,
    dirs: Vec<FileEntry>,
    total_bytes: u64,
    files_scanned: u64,
    fraction: f64,
    access_issues: AccessIssues,
    /// Top-most hidden directories and their unadjusted sizes.
    hidden: BTreeMap<PathBuf, u64>,
    /// Paths deleted since the last rescan.
    deleted: Vec<PathBuf>,
    interrupted: bool,
}

impl ScanSession {
    /// Create a session over a filesystem backend without a size cache.
    pub fn new(
        root: impl Into<PathBuf>,
        options: ScanOptions,
        fs: Arc<dyn FileSystemOperations>,
    ) -> Self {
        Self {
            root: root.into(),
            options,
            fs,
            cache: None,
            removals: None,
            files: Vec::new(),
            dirs: Vec::new(),
            total_bytes: 0,
            files_scanned: 0,
            fraction: 0.0,
            access_issues: AccessIssues::new(),
            hidden: BTreeMap::new(),
            deleted: Vec::new(),
            interrupted: false,
        }
    }

    /// Create a session sharing a coordinator's backend, options and cache.
    ///
    /// Deletes made through the session are also dropped from the
    /// coordinator's running scan.
    pub fn for_coordinator(coordinator: &ScanCoordinator, root: impl AsRef<Path>) -> Self {
        let fs = Arc::clone(coordinator.fs());
        let root = fs
            .canonicalize(root.as_ref())
            .unwrap_or_else(|_| root.as_ref().to_path_buf());
        let mut session = Self::new(root, coordinator.options().clone(), fs);
        session.cache = Some(Arc::clone(coordinator.cache()));
        session.removals = Some(coordinator.removals().clone());
        session
    }

    /// Scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bytes of all files read by the last snapshot.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Files read by the last snapshot.
    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    /// Progress of the last snapshot.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Access issues of the last finished scan.
    pub fn access_issues(&self) -> &AccessIssues {
        &self.access_issues
    }

    /// Check if the last scan was stopped early.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Hidden directories with the sizes subtracted for them.
    pub fn hidden(&self) -> &BTreeMap<PathBuf, u64> {
        &self.hidden
    }

    /// Paths deleted since the last rescan.
    pub fn deleted(&self) -> &[PathBuf] {
        &self.deleted
    }

    /// Ingest a progress snapshot.
    pub fn apply_progress(&mut self, progress: ScanProgress) {
        self.files = self.drop_deleted(progress.top_files);
        let dirs = self.drop_deleted(progress.top_dirs);
        self.dirs = self.adjust_for_hidden(dirs);
        self.total_bytes = progress.total_bytes;
        self.files_scanned = progress.files_scanned;
        self.fraction = self.fraction.max(progress.fraction);
    }

    /// Ingest the end of a scan.
    pub fn apply_outcome(&mut self, outcome: ScanOutcome) {
        self.interrupted = outcome.is_interrupted();
        let result = outcome.into_result();
        self.root = result.root;
        self.files = self.drop_deleted(result.files);
        let dirs = self.drop_deleted(result.dirs);
        self.dirs = self.adjust_for_hidden(dirs);
        self.total_bytes = result.total_bytes;
        self.files_scanned = result.files_scanned;
        self.access_issues = result.access_issues;
        if !self.interrupted {
            self.fraction = 1.0;
        }
    }

    /// Ingest any scan event.
    pub fn apply_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Progress(progress) => self.apply_progress(progress),
            ScanEvent::Finished(outcome) => self.apply_outcome(outcome),
        }
    }

    /// Files not under a hidden directory, up to the display limit.
    pub fn visible_files(&self) -> Vec<FileEntry> {
        self.files
            .iter()
            .filter(|f| !self.is_hidden(&f.path))
            .take(self.options.display_files_limit())
            .cloned()
            .collect()
    }

    /// Directories worth showing, up to the display limit.
    pub fn visible_dirs(&self) -> Vec<FileEntry> {
        let filter = ViewFilter::new(&self.root, &self.dirs);
        filter.apply(
            self.dirs.iter().filter(|d| !self.is_hidden(&d.path)),
            self.options.display_dirs_limit(),
        )
    }

    /// Displayed size of a listed directory.
    pub fn dir_size(&self, path: &Path) -> Option<u64> {
        self.dirs.iter().find(|d| d.path == path).map(|d| d.size)
    }

    /// Check if `path` is hidden itself or lies under a hidden directory.
    pub fn is_hidden(&self, path: &Path) -> bool {
        path.ancestors().any(|dir| self.hidden.contains_key(dir))
    }

    /// Hide a directory from every view.
    ///
    /// Never touches the filesystem. The directory's size is subtracted
    /// from each listed ancestor. Returns the subtracted size.
    pub fn hide(&mut self, path: &Path) -> Result<u64, OperationError> {
        if self.is_hidden(path) {
            return Err(OperationError::new(path, "already hidden"));
        }
        // A listed size already has inner hides taken off; a cached one is raw.
        let listed = self.dir_size(path);
        let known = match listed {
            Some(size) => size,
            None => self
                .cache
                .as_ref()
                .and_then(|cache| cache.get(path))
                .map(|(size, _)| size)
                .ok_or_else(|| OperationError::new(path, "not a known directory"))?,
        };

        // Hidden directories beneath this one fold into it.
        let inner: Vec<PathBuf> = self
            .hidden
            .keys()
            .filter(|h| h.starts_with(path))
            .cloned()
            .collect();
        let inner_bytes = inner
            .iter()
            .filter_map(|dir| self.hidden.remove(dir))
            .fold(0u64, u64::saturating_add);
        let (raw, displayed) = match listed {
            Some(_) => (known.saturating_add(inner_bytes), known),
            None => (known, known.saturating_sub(inner_bytes)),
        };

        for dir in self.dirs.iter_mut() {
            if dir.path != path && path.starts_with(&dir.path) {
                *dir = dir.with_size(dir.size.saturating_sub(displayed));
            }
        }
        self.hidden.insert(path.to_path_buf(), raw);
        if let Some(cache) = &self.cache {
            cache.invalidate(path);
        }

        debug!(path = %path.display(), bytes = displayed, "directory hidden");
        Ok(displayed)
    }

    /// Forget hidden state. The next snapshots show everything again.
    pub fn clear_hidden(&mut self) {
        self.hidden.clear();
    }

    /// Clear hidden and deleted state and scan the root again from scratch.
    pub fn rescan(&mut self, coordinator: &ScanCoordinator) -> Result<(), ScanError> {
        self.clear_hidden();
        self.deleted.clear();
        self.fraction = 0.0;
        let outcome = coordinator.scan(&self.root)?;
        self.apply_outcome(outcome);
        info!(root = %self.root.display(), "rescanned");
        Ok(())
    }

    /// Delete a file or directory tree after confirmation.
    ///
    /// On success the entry and everything beneath it leave the lists, now
    /// and in every later snapshot, and a running scan of the same
    /// coordinator drops it from its own state. Ancestor totals keep
    /// counting the removed bytes until the next rescan.
    pub fn delete(
        &mut self,
        path: &Path,
        confirm: &dyn Confirm,
        mode: DeleteMode,
    ) -> DeleteStatus {
        let metadata = match self.fs.stat(path) {
            Ok(metadata) => metadata,
            Err(error) => {
                return DeleteStatus::Failed(OperationError::new(path, error.to_string()));
            }
        };
        let is_dir = metadata.kind.is_dir();

        if !confirm.confirm_delete(path, is_dir) {
            debug!(path = %path.display(), "delete declined");
            return DeleteStatus::Declined;
        }

        let bytes_freed = self.known_size(path, is_dir, metadata.size);
        let removed = match mode {
            DeleteMode::Permanent => self.fs.remove(path, is_dir).map_err(|e| e.to_string()),
            DeleteMode::Trash => trash::delete(path).map_err(|e| e.to_string()),
        };
        if let Err(message) = removed {
            warn!(path = %path.display(), error = %message, "delete failed");
            return DeleteStatus::Failed(OperationError::new(path, message));
        }

        self.files.retain(|f| !f.is_within(path));
        self.dirs.retain(|d| !d.is_within(path));
        self.hidden.retain(|h, _| !h.starts_with(path));
        self.deleted.push(path.to_path_buf());
        if let Some(removals) = &self.removals {
            removals.push(path);
        }
        if let Some(cache) = &self.cache {
            cache.invalidate(path);
            if is_dir {
                cache.invalidate_by_pattern(&path.to_string_lossy());
            }
        }

        info!(path = %path.display(), bytes = bytes_freed, "deleted");
        DeleteStatus::Deleted { bytes_freed }
    }

    /// Delete several paths, each confirmed and reported on its own.
    pub fn delete_many<'a>(
        &mut self,
        paths: impl IntoIterator<Item = &'a Path>,
        confirm: &dyn Confirm,
        mode: DeleteMode,
    ) -> Vec<(PathBuf, DeleteStatus)> {
        paths
            .into_iter()
            .map(|path| (path.to_path_buf(), self.delete(path, confirm, mode)))
            .collect()
    }

    /// Current state as an export document, hidden entries left out.
    pub fn export_document(&self) -> ExportDocument {
        let files: Vec<FileEntry> = self
            .files
            .iter()
            .filter(|f| !self.is_hidden(&f.path))
            .cloned()
            .collect();
        let dirs: Vec<FileEntry> = self
            .dirs
            .iter()
            .filter(|d| !self.is_hidden(&d.path))
            .cloned()
            .collect();
        ExportDocument::from_parts(
            &self.root,
            &files,
            &dirs,
            self.total_bytes,
            self.files_scanned,
            &self.access_issues,
        )
    }

    /// Write the current state as JSON.
    pub fn export(&self, output: &Path) -> Result<ExportDocument, ExportError> {
        let doc = self.export_document();
        write_export(output, &doc)?;
        Ok(doc)
    }

    fn known_size(&self, path: &Path, is_dir: bool, stat_size: u64) -> u64 {
        if !is_dir {
            return self
                .files
                .iter()
                .find(|f| f.path == path)
                .map_or(stat_size, |f| f.size);
        }
        self.dir_size(path)
            .or_else(|| self.cache.as_ref().and_then(|c| c.get(path)).map(|(s, _)| s))
            .unwrap_or(0)
    }

    fn drop_deleted(&self, mut entries: Vec<FileEntry>) -> Vec<FileEntry> {
        if !self.deleted.is_empty() {
            entries.retain(|entry| !self.deleted.iter().any(|path| entry.is_within(path)));
        }
        entries
    }

    /// Subtract hidden sizes from the ancestors in a fresh list.
    ///
    /// A hidden directory still present in the list refreshes its
    /// recorded size first.
    fn adjust_for_hidden(&mut self, mut dirs: Vec<FileEntry>) -> Vec<FileEntry> {
        if self.hidden.is_empty() {
            return dirs;
        }
        for (path, size) in self.hidden.iter_mut() {
            if let Some(fresh) = dirs.iter().find(|d| &d.path == path) {
                *size = fresh.size;
            }
        }
        for dir in dirs.iter_mut() {
            let subtract: u64 = self
                .hidden
                .iter()
                .filter(|(path, _)| **path != dir.path && path.starts_with(&dir.path))
                .map(|(_, size)| *size)
                .sum();
            if subtract > 0 {
                *dir = dir.with_size(dir.size.saturating_sub(subtract));
            }
        }
        dirs
    }
}
