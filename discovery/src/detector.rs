use parking_lot::Mutex;
use tracing::debug;

/// Remembers the `composedAt` token of the last published snapshot.
///
/// The token is committed only after a snapshot built from it has been
/// published, so a cycle that fails after detecting a change is retried on the
/// next tick instead of being treated as "unchanged".
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Mutex<Option<String>>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing has been published yet or the token differs.
    pub fn needs_rebuild(&self, composed_at: &str) -> bool {
        let last = self.last.lock();
        let changed = last.as_deref() != Some(composed_at);

        debug!(
            previous = last.as_deref().unwrap_or("<none>"),
            current = composed_at,
            changed,
            "composedAt compared"
        );

        changed
    }

    pub fn commit(&self, composed_at: &str) {
        *self.last.lock() = Some(composed_at.to_string());
    }

    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }
}
