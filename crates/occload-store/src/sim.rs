//! Deterministic fault-injecting store.
//!
//! Connection bootstrapping and statement construction are collaborator
//! concerns, so the store this workspace ships is a simulation: it accepts
//! batches, injects OCC conflicts and fatal errors at configured rates from
//! a seeded RNG, and keeps counters the harness reports at shutdown. Tests
//! that need exact failure sequences use the scripted constructor instead
//! of rates.

use crate::client::{Row, StoreClient};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Fault injection rates for a [`SimulatedStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultProfile {
    /// Probability in `[0, 1]` that a batch hits an OCC conflict.
    pub conflict_rate: f64,
    /// Probability in `[0, 1]` that a batch hits a fatal constraint
    /// violation. Evaluated after `conflict_rate` on the same roll.
    pub fatal_rate: f64,
    /// Artificial latency applied to every call, if any.
    pub latency: Option<Duration>,
}

impl Default for FaultProfile {
    /// One batch in five conflicts; nothing fatal, no latency.
    fn default() -> Self {
        Self {
            conflict_rate: 0.2,
            fatal_rate: 0.0,
            latency: None,
        }
    }
}

/// A [`StoreClient`] that fabricates outcomes instead of writing anywhere.
///
/// Outcomes come from a scripted sequence when one was provided, otherwise
/// from a seeded RNG rolled against the [`FaultProfile`]. Either way the
/// store is deterministic: same seed or script, same sequence of results.
pub struct SimulatedStore {
    profile: FaultProfile,
    rng: Mutex<StdRng>,
    script: Mutex<VecDeque<Option<StoreError>>>,
    batches_accepted: AtomicU64,
    rows_accepted: AtomicU64,
}

impl SimulatedStore {
    /// Create a store that rolls outcomes from `profile` with a seeded RNG.
    pub fn new(profile: FaultProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            script: Mutex::new(VecDeque::new()),
            batches_accepted: AtomicU64::new(0),
            rows_accepted: AtomicU64::new(0),
        }
    }

    /// Create a store that replays `outcomes` in order: `Some(error)` fails
    /// the batch, `None` accepts it. Once drained, every batch succeeds.
    pub fn scripted<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Option<StoreError>>,
    {
        let mut store = Self::new(
            FaultProfile {
                conflict_rate: 0.0,
                fatal_rate: 0.0,
                latency: None,
            },
            0,
        );
        store.script = Mutex::new(outcomes.into_iter().collect());
        store
    }

    /// Number of batches accepted so far.
    pub fn batches_accepted(&self) -> u64 {
        self.batches_accepted.load(Ordering::Relaxed)
    }

    /// Number of rows accepted so far.
    pub fn rows_accepted(&self) -> u64 {
        self.rows_accepted.load(Ordering::Relaxed)
    }

    fn next_fault(&self, table: &str) -> Option<StoreError> {
        if let Some(scripted) = self.script.lock().expect("script lock").pop_front() {
            return scripted;
        }

        let roll: f64 = self.rng.lock().expect("rng lock").r#gen();
        if roll < self.profile.conflict_rate {
            Some(StoreError::OccConflict {
                table: table.to_string(),
                detail: "row version changed during batch".to_string(),
            })
        } else if roll < self.profile.conflict_rate + self.profile.fatal_rate {
            Some(StoreError::ConstraintViolation {
                table: table.to_string(),
                detail: "synthetic unique constraint".to_string(),
            })
        } else {
            None
        }
    }
}

#[async_trait]
impl StoreClient for SimulatedStore {
    async fn execute_batch(&self, table: &str, rows: &[Row]) -> Result<()> {
        if let Some(latency) = self.profile.latency {
            tokio::time::sleep(latency).await;
        }

        match self.next_fault(table) {
            Some(error) => {
                debug!(table, rows = rows.len(), %error, "injected store fault");
                Err(error)
            }
            None => {
                self.batches_accepted.fetch_add(1, Ordering::Relaxed);
                self.rows_accepted
                    .fetch_add(rows.len() as u64, Ordering::Relaxed);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SqlValue;

    fn row() -> Row {
        vec![SqlValue::Integer(1), SqlValue::Text("user_1@test.com".into())]
    }

    #[tokio::test]
    async fn test_scripted_outcomes_replay_in_order() {
        let store = SimulatedStore::scripted(vec![
            Some(StoreError::OccConflict {
                table: "t".into(),
                detail: "version".into(),
            }),
            None,
            Some(StoreError::TableMissing("t".into())),
        ]);

        assert!(matches!(
            store.execute_batch("t", &[row()]).await,
            Err(StoreError::OccConflict { .. })
        ));
        assert!(store.execute_batch("t", &[row()]).await.is_ok());
        assert!(matches!(
            store.execute_batch("t", &[row()]).await,
            Err(StoreError::TableMissing(_))
        ));

        // Drained script: everything succeeds from here on.
        assert!(store.execute_batch("t", &[row()]).await.is_ok());
        assert_eq!(store.batches_accepted(), 2);
        assert_eq!(store.rows_accepted(), 2);
    }

    #[tokio::test]
    async fn test_same_seed_same_outcome_sequence() {
        let profile = FaultProfile {
            conflict_rate: 0.5,
            fatal_rate: 0.1,
            latency: None,
        };
        let first = SimulatedStore::new(profile, 42);
        let second = SimulatedStore::new(profile, 42);

        for _ in 0..32 {
            let a = first.execute_batch("t", &[row()]).await;
            let b = second.execute_batch("t", &[row()]).await;
            assert_eq!(a.is_ok(), b.is_ok());
            if let (Err(a), Err(b)) = (a, b) {
                assert_eq!(a.to_string(), b.to_string());
            }
        }
    }

    #[tokio::test]
    async fn test_zero_rates_always_accept() {
        let store = SimulatedStore::new(
            FaultProfile {
                conflict_rate: 0.0,
                fatal_rate: 0.0,
                latency: None,
            },
            7,
        );

        for _ in 0..16 {
            assert!(store.execute_batch("t", &[row(), row()]).await.is_ok());
        }
        assert_eq!(store.batches_accepted(), 16);
        assert_eq!(store.rows_accepted(), 32);
    }
}
