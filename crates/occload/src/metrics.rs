//! Pool-wide counters.
//!
//! Workers never share task state; these atomics are the only cross-worker
//! bookkeeping besides the dead-letter sink.

use crate::task::TaskOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters shared by every worker in a pool.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    attempts: AtomicU64,
    succeeded: AtomicU64,
    dead_lettered: AtomicU64,
    cancelled: AtomicU64,
}

impl PoolMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one terminal outcome into the counters.
    pub fn observe(&self, outcome: &TaskOutcome) {
        self.attempts
            .fetch_add(u64::from(outcome.attempts()), Ordering::Relaxed);
        let counter = match outcome {
            TaskOutcome::Success { .. } => &self.succeeded,
            TaskOutcome::DeadLettered { .. } => &self.dead_lettered,
            TaskOutcome::Cancelled { .. } => &self.cancelled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A consistent-enough snapshot for reporting.
    pub fn summary(&self) -> PoolSummary {
        PoolSummary {
            attempts: self.attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    /// Total executions across all tasks, retries included.
    pub attempts: u64,
    /// Tasks whose batch was accepted.
    pub succeeded: u64,
    /// Tasks handed to the dead-letter sink.
    pub dead_lettered: u64,
    /// Tasks interrupted by shutdown.
    pub cancelled: u64,
}

impl PoolSummary {
    /// Tasks that reached any terminal state.
    pub fn total_tasks(&self) -> u64 {
        self.succeeded + self.dead_lettered + self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_tallies_by_outcome() {
        let metrics = PoolMetrics::new();
        metrics.observe(&TaskOutcome::Success { attempts: 3 });
        metrics.observe(&TaskOutcome::DeadLettered { attempts: 5 });
        metrics.observe(&TaskOutcome::Cancelled {
            attempts_completed: 1,
        });

        let summary = metrics.summary();
        assert_eq!(summary.attempts, 9);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.dead_lettered, 1);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(summary.total_tasks(), 3);
    }
}
