use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::snapshot::Snapshot;

/// Holds the currently published snapshot and the update feed.
///
/// Readers load the pointer without locking and keep the `Arc` for as long as
/// they need one consistent generation. Publishing swaps the pointer, then
/// notifies subscribers. The feed is bounded: a subscriber that falls behind
/// loses the oldest notifications and never blocks the publisher.
#[derive(Clone)]
pub struct SnapshotStore {
    current: Arc<ArcSwapOption<Snapshot>>,
    updates: broadcast::Sender<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new(updates_capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(updates_capacity.max(1));
        Self {
            current: Arc::new(ArcSwapOption::empty()),
            updates,
        }
    }

    /// The published snapshot, or `None` before the first publish.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Makes `snapshot` current and pushes it onto the update feed.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.current.store(Some(Arc::clone(&snapshot)));

        let composed_at = snapshot.composed_at().to_string();
        match self.updates.send(snapshot) {
            Ok(receivers) => info!(%composed_at, receivers, "snapshot published"),
            Err(_) => debug!(%composed_at, "snapshot published with no subscribers"),
        }
    }

    /// A new handle on the update feed. Only snapshots published after this
    /// call are delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Snapshot>> {
        self.updates.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}
