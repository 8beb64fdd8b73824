//! Registry of progress subscribers.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use spacehog_core::ScanProgress;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// Buffered snapshots per subscriber.
const CHANNEL_CAPACITY: usize = 100;

/// Handle returned by [`ProgressSubscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    senders: BTreeMap<SubscriberId, mpsc::Sender<ScanProgress>>,
}

/// Explicit fan-out of progress snapshots.
///
/// Subscribers stay registered until they call
/// [`unsubscribe`](Self::unsubscribe) or drop their receiver. A subscriber
/// that falls behind misses snapshots instead of stalling the scan; since
/// every snapshot is complete, the next one it receives catches it up.
#[derive(Debug, Clone, Default)]
pub struct ProgressSubscribers {
    registry: Arc<Mutex<Registry>>,
}

impl ProgressSubscribers {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<ScanProgress>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut registry = self.registry.lock();
        let id = SubscriberId(registry.next_id);
        registry.next_id += 1;
        registry.senders.insert(id, tx);
        (id, rx)
    }

    /// Remove a subscriber. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.registry.lock().senders.remove(&id).is_some()
    }

    /// Deliver a snapshot to every subscriber without blocking.
    pub fn publish(&self, progress: &ScanProgress) {
        let mut registry = self.registry.lock();
        registry.senders.retain(|id, tx| match tx.try_send(progress.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!(?id, "subscriber lagging, snapshot dropped");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.registry.lock().senders.len()
    }

    /// Check if nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.registry.lock().senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(files: u64) -> ScanProgress {
        ScanProgress {
            files_scanned: files,
            ..ScanProgress::new()
        }
    }

    #[test]
    fn test_publish_reaches_all() {
        let subs = ProgressSubscribers::new();
        let (_, mut rx1) = subs.subscribe();
        let (_, mut rx2) = subs.subscribe();

        subs.publish(&progress(7));
        assert_eq!(rx1.try_recv().unwrap().files_scanned, 7);
        assert_eq!(rx2.try_recv().unwrap().files_scanned, 7);
    }

    #[test]
    fn test_unsubscribe_is_explicit() {
        let subs = ProgressSubscribers::new();
        let (id, mut rx) = subs.subscribe();
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
        assert!(subs.is_empty());

        subs.publish(&progress(1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_receivers_pruned() {
        let subs = ProgressSubscribers::new();
        let (_, rx) = subs.subscribe();
        let (_, _kept) = subs.subscribe();
        drop(rx);

        subs.publish(&progress(1));
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let subs = ProgressSubscribers::new();
        let (_, mut rx) = subs.subscribe();
        for n in 0..(CHANNEL_CAPACITY as u64 + 10) {
            subs.publish(&progress(n));
        }
        assert_eq!(subs.len(), 1);
        assert_eq!(rx.try_recv().unwrap().files_scanned, 0);
    }
}
