//! Adaptive progress cadence.
//!
//! Both the directory recompute interval and the emission interval widen
//! as more files are scanned, trading freshness for CPU on large trees.

use std::time::{Duration, Instant};

/// Files processed per cursor pull before yielding.
pub const CHUNK_FILES: usize = 250;

/// Files since the last emission that force a new one regardless of time.
pub const FORCED_EMIT_FILES: u64 = 5000;

/// Ceiling of the running progress estimate.
const MAX_RUNNING_FRACTION: f64 = 0.95;

/// Interval between "largest directories" recomputations.
pub fn recompute_interval(files_scanned: u64) -> Duration {
    match files_scanned {
        0..=5_000 => Duration::from_secs(1),
        5_001..=10_000 => Duration::from_secs(2),
        10_001..=50_000 => Duration::from_secs(3),
        _ => Duration::from_secs(5),
    }
}

/// Interval between progress emissions.
pub fn emit_interval(files_scanned: u64) -> Duration {
    match files_scanned {
        0..=5_000 => Duration::from_millis(500),
        5_001..=10_000 => Duration::from_secs(1),
        10_001..=50_000 => Duration::from_secs(2),
        50_001..=100_000 => Duration::from_secs(3),
        _ => Duration::from_secs(5),
    }
}

/// Saturating progress estimate; approaches but never reaches 1.0.
pub fn progress_fraction(files_scanned: u64) -> f64 {
    let n = files_scanned as f64;
    (n / (n + 1000.0)).min(MAX_RUNNING_FRACTION)
}

/// Tracks when the last recompute and emission happened.
///
/// Callers pass `now` so decisions are deterministic under test. Nothing
/// has happened yet on a fresh cadence, so the first check of each kind
/// fires.
#[derive(Debug, Clone, Default)]
pub struct Cadence {
    last_recompute: Option<Instant>,
    last_emit: Option<Instant>,
    files_at_last_emit: u64,
}

impl Cadence {
    /// Create a fresh cadence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the largest-directories view is due for a recompute.
    pub fn should_recompute(&self, now: Instant, files_scanned: u64) -> bool {
        let interval = recompute_interval(files_scanned);
        self.last_recompute
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Check if a progress snapshot is due.
    pub fn should_emit(&self, now: Instant, files_scanned: u64) -> bool {
        if files_scanned.saturating_sub(self.files_at_last_emit) > FORCED_EMIT_FILES {
            return true;
        }
        let interval = emit_interval(files_scanned);
        self.last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Record a recompute.
    pub fn mark_recomputed(&mut self, now: Instant) {
        self.last_recompute = Some(now);
    }

    /// Record an emission.
    pub fn mark_emitted(&mut self, now: Instant, files_scanned: u64) {
        self.last_emit = Some(now);
        self.files_at_last_emit = files_scanned;
    }
}
