//! Incremental disk usage scanning engine for spacehog.
//!
//! # Overview
//!
//! `spacehog-scan` walks a directory tree and keeps a live, approximate
//! answer to "what is taking up the space" while the walk is running:
//!
//! - **Bounded top-K** of the largest files, O(K) memory for any tree size
//! - **Ancestor-chain aggregation** so every directory total is correct for
//!   the files read so far
//! - **Adaptive cadence** for recomputing the largest directories and
//!   emitting progress
//! - **Cooperative stop** between entries, yielding a partial result
//!
//! Inaccessible paths never fail a scan; they are recorded and skipped.
//!
//! # Example
//!
//! ```rust,no_run
//! use spacehog_core::ScanOptions;
//! use spacehog_scan::ScanCoordinator;
//!
//! let coordinator = ScanCoordinator::new(ScanOptions::new(20, 10));
//! let result = coordinator.scan("/path/to/scan").unwrap().into_result();
//!
//! println!("Total size: {} bytes", result.total_bytes);
//! println!("Total files: {}", result.files_scanned);
//! ```
//!
//! # Streaming
//!
//! [`ScanCoordinator::scan_async`] yields a snapshot at adaptive intervals
//! and ends with exactly one [`ScanEvent::Finished`]:
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use spacehog_core::ScanOptions;
//! use spacehog_scan::{ScanCoordinator, ScanEvent};
//!
//! # async fn run() -> Result<(), spacehog_core::ScanError> {
//! let coordinator = ScanCoordinator::new(ScanOptions::default());
//! let stream = coordinator.scan_async("/path/to/scan")?;
//! futures::pin_mut!(stream);
//!
//! while let Some(event) = stream.next().await {
//!     match event {
//!         ScanEvent::Progress(p) => println!("{} files", p.files_scanned),
//!         ScanEvent::Finished(outcome) => println!("done: {:?}", outcome.is_interrupted()),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod cache;
mod cadence;
mod coordinator;
mod fs;
mod removals;
mod subscribers;
mod topk;
mod walker;

pub use aggregate::{ANCESTOR_LEVELS, DirectorySizeAggregator};
pub use cache::{DirectoryCacheEntry, DirectorySizeCache};
pub use cadence::{
    CHUNK_FILES, Cadence, FORCED_EMIT_FILES, emit_interval, progress_fraction, recompute_interval,
};
pub use coordinator::{ScanCoordinator, ScanCursor, ScanEvent};
pub use fs::{FileSystemOperations, Metadata, StdFileSystem};
#[cfg(any(test, feature = "mock"))]
pub use fs::MockFileSystem;
pub use removals::PendingRemovals;
pub use subscribers::{ProgressSubscribers, SubscriberId};
pub use topk::{HasSize, TopKSelector};
pub use walker::{FileSystemWalker, WalkEntry};

// Re-export core types for convenience
pub use spacehog_core::{
    AccessError, AccessErrorKind, AccessIssues, FileEntry, ScanError, ScanOptions, ScanOutcome,
    ScanProgress, ScanResult, StorageClass,
};
