use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Minimal counters for operational visibility of the refresh loop.
#[derive(Clone, Debug, Default)]
pub struct RefreshCounters {
    pub cycles: Arc<AtomicU64>,
    pub unchanged: Arc<AtomicU64>,
    pub published: Arc<AtomicU64>,
    pub failures: Arc<AtomicU64>,

    /// Keys overwritten by later entries across all published snapshots.
    pub duplicate_keys: Arc<AtomicU64>,
}

/// Point-in-time copy of [`RefreshCounters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub cycles: u64,
    pub unchanged: u64,
    pub published: u64,
    pub failures: u64,
    pub duplicate_keys: u64,
}

impl RefreshCounters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            duplicate_keys: self.duplicate_keys.load(Ordering::Relaxed),
        }
    }
}

pub(crate) fn bump(c: &AtomicU64) {
    c.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn add(c: &AtomicU64, n: u64) {
    c.fetch_add(n, Ordering::Relaxed);
}
