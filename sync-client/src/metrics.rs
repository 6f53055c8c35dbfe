//! Operational counters for the update engine.

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational metrics for monitoring engine activity.
///
/// All counters are monotonically increasing (reset only on restart).
/// Thread-safe via `AtomicU64`, so callers never need the engine gate
/// to read or bump them.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Containers processed to completion (including aborted batches).
    pub containers_processed: AtomicU64,
    /// Containers dropped because the global position was unknown.
    pub containers_dropped: AtomicU64,
    /// Events handed to the dispatcher.
    pub events_applied: AtomicU64,
    /// Counted events ignored as already applied.
    pub duplicates_ignored: AtomicU64,
    /// Gaps detected by the gap check.
    pub gaps_detected: AtomicU64,
    /// Difference loader runs (global and per-channel).
    pub recoveries_total: AtomicU64,
    /// Difference pages applied.
    pub recovery_pages: AtomicU64,
    /// Errors routed to the observer.
    pub errors_total: AtomicU64,
}

/// Point-in-time copy of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// See [`EngineMetrics::containers_processed`].
    pub containers_processed: u64,
    /// See [`EngineMetrics::containers_dropped`].
    pub containers_dropped: u64,
    /// See [`EngineMetrics::events_applied`].
    pub events_applied: u64,
    /// See [`EngineMetrics::duplicates_ignored`].
    pub duplicates_ignored: u64,
    /// See [`EngineMetrics::gaps_detected`].
    pub gaps_detected: u64,
    /// See [`EngineMetrics::recoveries_total`].
    pub recoveries_total: u64,
    /// See [`EngineMetrics::recovery_pages`].
    pub recovery_pages: u64,
    /// See [`EngineMetrics::errors_total`].
    pub errors_total: u64,
}

impl EngineMetrics {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            containers_processed: self.containers_processed.load(Ordering::Relaxed),
            containers_dropped: self.containers_dropped.load(Ordering::Relaxed),
            events_applied: self.events_applied.load(Ordering::Relaxed),
            duplicates_ignored: self.duplicates_ignored.load(Ordering::Relaxed),
            gaps_detected: self.gaps_detected.load(Ordering::Relaxed),
            recoveries_total: self.recoveries_total.load(Ordering::Relaxed),
            recovery_pages: self.recovery_pages.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_bumps() {
        let metrics = EngineMetrics::default();
        EngineMetrics::bump(&metrics.gaps_detected);
        EngineMetrics::bump(&metrics.gaps_detected);
        EngineMetrics::bump(&metrics.events_applied);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.gaps_detected, 2);
        assert_eq!(snapshot.events_applied, 1);
        assert_eq!(snapshot.errors_total, 0);
    }
}
