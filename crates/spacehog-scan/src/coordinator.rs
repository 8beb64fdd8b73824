//! Scan orchestration: blocking and streaming drivers over a pull cursor.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures::Stream;
use parking_lot::Mutex;
use spacehog_core::{
    EntryKind, FileEntry, ScanError, ScanOptions, ScanOutcome, ScanProgress, ScanResult,
    StorageClass,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::aggregate::{ANCESTOR_LEVELS, DirectorySizeAggregator};
use crate::cache::DirectorySizeCache;
use crate::cadence::{CHUNK_FILES, Cadence, progress_fraction};
use crate::fs::{FileSystemOperations, StdFileSystem};
use crate::removals::PendingRemovals;
use crate::subscribers::{ProgressSubscribers, SubscriberId};
use crate::topk::TopKSelector;
use crate::walker::{FileSystemWalker, WalkEntry};

/// Something a scan reports.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// A complete point-in-time snapshot.
    Progress(ScanProgress),
    /// The scan is over. Always the last event.
    Finished(ScanOutcome),
}

/// Runs scans and owns the state shared between them.
///
/// # Example
///
/// ```rust,no_run
/// use spacehog_core::ScanOptions;
/// use spacehog_scan::ScanCoordinator;
///
/// let coordinator = ScanCoordinator::new(ScanOptions::default());
/// let outcome = coordinator.scan("/path/to/scan").unwrap();
/// for file in &outcome.result().files {
///     println!("{:>12} {}", file.size, file.path.display());
/// }
/// ```
pub struct ScanCoordinator {
    options: Arc<ScanOptions>,
    fs: Arc<dyn FileSystemOperations>,
    cache: Arc<DirectorySizeCache>,
    stop: Mutex<CancellationToken>,
    subscribers: ProgressSubscribers,
    removals: PendingRemovals,
    cache_root: Mutex<Option<PathBuf>>,
}

impl ScanCoordinator {
    /// Create a coordinator over the real filesystem.
    pub fn new(options: ScanOptions) -> Self {
        Self::with_fs(options, Arc::new(StdFileSystem::new()))
    }

    /// Create a coordinator over a custom filesystem backend.
    pub fn with_fs(options: ScanOptions, fs: Arc<dyn FileSystemOperations>) -> Self {
        let cache = Arc::new(DirectorySizeCache::with_ttl(options.cache_ttl));
        Self {
            options: Arc::new(options),
            fs,
            cache,
            stop: Mutex::new(CancellationToken::new()),
            subscribers: ProgressSubscribers::new(),
            removals: PendingRemovals::new(),
            cache_root: Mutex::new(None),
        }
    }

    /// Options every scan of this coordinator uses.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Filesystem backend.
    pub fn fs(&self) -> &Arc<dyn FileSystemOperations> {
        &self.fs
    }

    /// Directory size cache shared across scans of the same root.
    pub fn cache(&self) -> &Arc<DirectorySizeCache> {
        &self.cache
    }

    /// Last known size of a directory, if cached and fresh.
    pub fn cached_size(&self, path: &Path) -> Option<(u64, StorageClass)> {
        self.cache.get(path)
    }

    /// Token that stops the running scan when cancelled.
    ///
    /// A scan started after the token was cancelled gets a fresh one, so
    /// fetch the token again for each scan.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.lock().clone()
    }

    /// Request a cooperative stop of the running scan.
    pub fn stop(&self) {
        self.stop.lock().cancel();
    }

    /// Register for progress snapshots of every scan.
    pub fn subscribe(&self) -> (SubscriberId, tokio::sync::mpsc::Receiver<ScanProgress>) {
        self.subscribers.subscribe()
    }

    /// Remove a progress subscriber.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Queue of paths removed from disk, applied to the running scan.
    pub fn removals(&self) -> &PendingRemovals {
        &self.removals
    }

    /// Tell the running scan that `path` no longer exists.
    ///
    /// The next pull drops it and everything beneath it from the largest
    /// files and directories and stops walking it. Ancestor totals keep
    /// the removed bytes until the next scan.
    pub fn forget(&self, path: impl AsRef<Path>) {
        self.removals.push(path);
    }

    /// Scan to the end on the calling thread.
    ///
    /// Only a stop request ends it early, yielding
    /// [`ScanOutcome::Interrupted`] with whatever was gathered.
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<ScanOutcome, ScanError> {
        let mut outcome = None;
        for event in self.cursor(root)? {
            if let ScanEvent::Finished(finished) = event {
                outcome = Some(finished);
            }
        }
        outcome.ok_or(ScanError::Interrupted)
    }

    /// Scan as a stream of events.
    ///
    /// The root is validated before the stream is returned. Each poll does
    /// one bounded chunk of work and then yields back to the runtime.
    pub fn scan_async(
        &self,
        root: impl AsRef<Path>,
    ) -> Result<impl Stream<Item = ScanEvent> + Send + 'static, ScanError> {
        let mut cursor = self.cursor(root)?;
        Ok(stream! {
            while !cursor.is_finished() {
                if let Some(event) = cursor.pull() {
                    yield event;
                }
                tokio::task::yield_now().await;
            }
        })
    }

    /// Start a scan and return its pull cursor.
    pub fn cursor(&self, root: impl AsRef<Path>) -> Result<ScanCursor, ScanError> {
        let requested = root.as_ref();
        let root = self
            .fs
            .canonicalize(requested)
            .map_err(|_| ScanError::InvalidPath {
                path: requested.to_path_buf(),
            })?;

        let walker =
            FileSystemWalker::new(Arc::clone(&self.fs), Arc::clone(&self.options), &root)?;
        self.reset_cache_for(&root);
        // Removals queued before this walk are already reflected on disk.
        self.removals.clear();

        let mut aggregator = DirectorySizeAggregator::new(&root);
        for ancestor in root.ancestors().skip(1).take(ANCESTOR_LEVELS) {
            if let Ok(metadata) = self.fs.stat(ancestor) {
                aggregator.record_directory(ancestor, metadata.modified);
            }
        }

        info!(root = %root.display(), "scan started");
        Ok(ScanCursor {
            top_files: TopKSelector::new(self.options.max_files),
            options: Arc::clone(&self.options),
            cache: Arc::clone(&self.cache),
            subscribers: self.subscribers.clone(),
            removals: self.removals.clone(),
            stop: self.arm_stop(),
            root,
            walker,
            aggregator,
            top_dirs: Vec::new(),
            files_scanned: 0,
            total_bytes: 0,
            fraction: 0.0,
            cadence: Cadence::new(),
            started: Instant::now(),
            pending: VecDeque::new(),
            done: false,
        })
    }

    fn arm_stop(&self) -> CancellationToken {
        let mut token = self.stop.lock();
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        token.clone()
    }

    /// Cached sizes never leak from one scan root to another.
    fn reset_cache_for(&self, root: &Path) {
        let mut current = self.cache_root.lock();
        if current.as_deref() != Some(root) {
            self.cache.clear();
            *current = Some(root.to_path_buf());
        }
    }
}

/// Pull-based state machine behind both scan drivers.
///
/// Each [`pull`](Self::pull) walks at most [`CHUNK_FILES`] files or up to
/// one directory completion, then returns. Suspension never happens inside
/// a single entry. The stop token is checked before every entry.
pub struct ScanCursor {
    root: PathBuf,
    options: Arc<ScanOptions>,
    cache: Arc<DirectorySizeCache>,
    subscribers: ProgressSubscribers,
    removals: PendingRemovals,
    stop: CancellationToken,
    walker: FileSystemWalker,
    top_files: TopKSelector<FileEntry>,
    aggregator: DirectorySizeAggregator,
    top_dirs: Vec<FileEntry>,
    files_scanned: u64,
    total_bytes: u64,
    fraction: f64,
    cadence: Cadence,
    started: Instant,
    pending: VecDeque<ScanEvent>,
    done: bool,
}

impl ScanCursor {
    /// The canonical scan root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files read so far.
    pub fn files_scanned(&self) -> u64 {
        self.files_scanned
    }

    /// Check if the final event has been handed out.
    pub fn is_finished(&self) -> bool {
        self.done && self.pending.is_empty()
    }

    /// Do one bounded chunk of work.
    ///
    /// Returns the event it produced, if any. Most chunks produce nothing;
    /// keep pulling until [`is_finished`](Self::is_finished).
    pub fn pull(&mut self) -> Option<ScanEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }
        if self.done {
            return None;
        }
        self.apply_removals();

        let mut chunk = 0;
        loop {
            if self.stop.is_cancelled() {
                return Some(self.finish_interrupted());
            }
            match self.walker.next() {
                None => return self.finish_completed(),
                Some(entry) if entry.kind == EntryKind::Directory => {
                    self.aggregator.record_directory(&entry.path, entry.modified);
                    break;
                }
                Some(entry) => {
                    self.record_file(entry);
                    chunk += 1;
                    if chunk >= CHUNK_FILES {
                        break;
                    }
                }
            }
        }

        self.checkpoint()
    }

    fn apply_removals(&mut self) {
        for path in self.removals.take() {
            let files = self.top_files.remove_where(|file| file.is_within(&path));
            self.top_dirs.retain(|dir| !dir.is_within(&path));
            let dirs = self.aggregator.forget_within(&path);
            self.walker.prune(&path);
            debug!(path = %path.display(), files, dirs, "dropped removed path from scan");
        }
    }

    fn record_file(&mut self, entry: WalkEntry) {
        let storage_class = self.options.storage_class_for(&entry.path);
        self.files_scanned += 1;
        self.total_bytes = self.total_bytes.saturating_add(entry.size);
        self.aggregator
            .record_file(&entry.path, entry.size, storage_class);

        if self.top_files.admits(entry.size) {
            self.top_files.insert(FileEntry::new(
                entry.path,
                entry.size,
                entry.modified,
                storage_class,
            ));
        }
    }

    fn checkpoint(&mut self) -> Option<ScanEvent> {
        let now = Instant::now();
        if self.cadence.should_recompute(now, self.files_scanned) {
            trace!(files = self.files_scanned, "recomputing largest directories");
            self.recompute_dirs();
            self.cache.set_many(
                self.top_dirs
                    .iter()
                    .map(|dir| (dir.path.clone(), dir.size, dir.storage_class)),
            );
            self.cadence.mark_recomputed(now);
        }

        if !self.cadence.should_emit(now, self.files_scanned) {
            return None;
        }
        trace!(files = self.files_scanned, "emitting progress");
        self.cadence.mark_emitted(now, self.files_scanned);
        self.fraction = self.fraction.max(progress_fraction(self.files_scanned));
        let progress = self.snapshot();
        self.subscribers.publish(&progress);
        Some(ScanEvent::Progress(progress))
    }

    fn recompute_dirs(&mut self) {
        self.top_dirs = self.aggregator.largest(self.options.max_dirs);
    }

    fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            fraction: self.fraction,
            top_files: self.top_files.to_vec(),
            top_dirs: self.top_dirs.clone(),
            files_scanned: self.files_scanned,
            total_bytes: self.total_bytes,
        }
    }

    fn result(&mut self) -> ScanResult {
        ScanResult {
            root: self.root.clone(),
            files: self.top_files.to_vec(),
            dirs: self.top_dirs.clone(),
            total_bytes: self.total_bytes,
            files_scanned: self.files_scanned,
            access_issues: self.walker.take_issues(),
            scan_duration: self.started.elapsed(),
        }
    }

    fn finish_completed(&mut self) -> Option<ScanEvent> {
        self.done = true;
        self.recompute_dirs();
        self.cache.set_many(
            self.aggregator
                .iter()
                .map(|(path, size, class)| (path.to_path_buf(), size, class)),
        );

        self.fraction = 1.0;
        let progress = self.snapshot();
        self.subscribers.publish(&progress);

        let result = self.result();
        info!(
            root = %self.root.display(),
            files = result.files_scanned,
            bytes = result.total_bytes,
            issues = result.access_issues.len(),
            elapsed_ms = result.scan_duration.as_millis() as u64,
            "scan completed"
        );
        self.pending
            .push_back(ScanEvent::Finished(ScanOutcome::Completed(result)));
        Some(ScanEvent::Progress(progress))
    }

    fn finish_interrupted(&mut self) -> ScanEvent {
        self.done = true;
        self.recompute_dirs();
        let result = self.result();
        info!(
            root = %self.root.display(),
            files = result.files_scanned,
            "scan interrupted"
        );
        ScanEvent::Finished(ScanOutcome::Interrupted(result))
    }
}

impl Iterator for ScanCursor {
    type Item = ScanEvent;

    fn next(&mut self) -> Option<ScanEvent> {
        while !self.is_finished() {
            if let Some(event) = self.pull() {
                return Some(event);
            }
        }
        None
    }
}
