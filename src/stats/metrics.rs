//! Control-plane counters
//!
//! Cheap atomic counters for the orchestrator's own activity. Anything
//! beyond counting (alerting, per-stream metrics) belongs to the
//! monitoring subsystem, not here.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the orchestrator's activity counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    /// Applications successfully created
    pub apps_created: u64,
    /// Applications deleted
    pub apps_deleted: u64,
    /// Application creations rolled back after a module rejected them
    pub create_rollbacks: u64,
    /// Pull requests issued to providers
    pub pulls_requested: u64,
    /// Pull requests a provider accepted
    pub pulls_succeeded: u64,
    /// Streams attributed to an origin or domain rule
    pub streams_created: u64,
    /// Streams removed
    pub streams_deleted: u64,
}

/// Internal atomic counter block
#[derive(Default)]
pub(crate) struct StatCounters {
    pub(crate) apps_created: AtomicU64,
    pub(crate) apps_deleted: AtomicU64,
    pub(crate) create_rollbacks: AtomicU64,
    pub(crate) pulls_requested: AtomicU64,
    pub(crate) pulls_succeeded: AtomicU64,
    pub(crate) streams_created: AtomicU64,
    pub(crate) streams_deleted: AtomicU64,
}

impl StatCounters {
    /// Read a consistent-enough snapshot of all counters
    pub(crate) fn snapshot(&self) -> OrchestratorStats {
        OrchestratorStats {
            apps_created: self.apps_created.load(Ordering::Relaxed),
            apps_deleted: self.apps_deleted.load(Ordering::Relaxed),
            create_rollbacks: self.create_rollbacks.load(Ordering::Relaxed),
            pulls_requested: self.pulls_requested.load(Ordering::Relaxed),
            pulls_succeeded: self.pulls_succeeded.load(Ordering::Relaxed),
            streams_created: self.streams_created.load(Ordering::Relaxed),
            streams_deleted: self.streams_deleted.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let counters = StatCounters::default();
        StatCounters::bump(&counters.apps_created);
        StatCounters::bump(&counters.apps_created);
        StatCounters::bump(&counters.pulls_requested);

        let stats = counters.snapshot();
        assert_eq!(stats.apps_created, 2);
        assert_eq!(stats.pulls_requested, 1);
        assert_eq!(stats.apps_deleted, 0);
    }
}
