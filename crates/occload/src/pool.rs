//! The worker pool.
//!
//! N workers share one task source. Each worker pulls a task and drives it
//! through its whole state machine, retries and sleeps included, before
//! pulling the next, so dispatch order is preserved per worker and no task
//! is ever observed by two workers. The shared surface is deliberately
//! small: the task receiver, the dead-letter sink, and the metrics atomics.

use crate::deadletter::DeadLetterSink;
use crate::metrics::{PoolMetrics, PoolSummary};
use crate::task::{self, WorkerTask};
use occload_core::retry::ExponentialBackoff;
use occload_store::StoreClient;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

/// Creates a shutdown signal channel.
///
/// Send `true` to ask every worker to stop: sleepers wake early and mark
/// their in-flight task cancelled, idle workers stop pulling.
pub fn shutdown_signal() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// A fixed-size pool of workers driving [`WorkerTask`]s to completion.
pub struct WorkerPool<S> {
    store: Arc<S>,
    backoff: ExponentialBackoff,
    workers: usize,
    seed: Option<u64>,
    sink: Arc<DeadLetterSink>,
    metrics: Arc<PoolMetrics>,
}

impl<S> WorkerPool<S>
where
    S: StoreClient + 'static,
{
    /// Create a pool of `workers` workers writing through `store`.
    pub fn new(store: Arc<S>, backoff: ExponentialBackoff, workers: usize) -> Self {
        Self {
            store,
            backoff,
            workers: workers.max(1),
            seed: None,
            sink: Arc::new(DeadLetterSink::new()),
            metrics: Arc::new(PoolMetrics::new()),
        }
    }

    /// Seed the per-worker jitter RNGs for reproducible delay sequences.
    /// Each worker derives its own stream from the seed and its index.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The pool's dead-letter sink.
    pub fn sink(&self) -> Arc<DeadLetterSink> {
        Arc::clone(&self.sink)
    }

    /// The pool's counters.
    pub fn metrics(&self) -> Arc<PoolMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run tasks from `tasks` until the channel closes or shutdown fires,
    /// then return the final counts.
    pub async fn run(
        &self,
        tasks: mpsc::Receiver<WorkerTask>,
        shutdown: watch::Receiver<bool>,
    ) -> PoolSummary {
        let tasks = Arc::new(Mutex::new(tasks));
        let mut handles = Vec::with_capacity(self.workers);

        for index in 0..self.workers {
            let store = Arc::clone(&self.store);
            let backoff = self.backoff.clone();
            let sink = Arc::clone(&self.sink);
            let metrics = Arc::clone(&self.metrics);
            let tasks = Arc::clone(&tasks);
            let mut shutdown = shutdown.clone();
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64 + 1)),
                None => StdRng::from_entropy(),
            };

            handles.push(tokio::spawn(async move {
                debug!(worker = index, "worker started");
                loop {
                    if *shutdown.borrow() {
                        break;
                    }
                    // Hold the receiver lock only while idle; it is released
                    // before the task is driven, so workers never wait on
                    // each other's retries.
                    let task = {
                        let mut receiver = tasks.lock().await;
                        tokio::select! {
                            next = receiver.recv() => match next {
                                Some(task) => task,
                                None => break,
                            },
                            _ = shutdown.wait_for(|stop| *stop) => break,
                        }
                    };
                    let outcome = task::drive(
                        task,
                        store.as_ref(),
                        &backoff,
                        &mut rng,
                        &mut shutdown,
                        &sink,
                    )
                    .await;
                    metrics.observe(&outcome);
                }
                debug!(worker = index, "worker stopped");
            }));
        }

        for handle in handles {
            if let Err(error) = handle.await {
                warn!(%error, "worker terminated abnormally");
            }
        }

        self.metrics.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occload_core::retry::JitterStrategy;
    use occload_store::{FaultProfile, SimulatedStore, SqlValue};
    use std::time::Duration;

    fn clean_store() -> Arc<SimulatedStore> {
        Arc::new(SimulatedStore::new(
            FaultProfile {
                conflict_rate: 0.0,
                fatal_rate: 0.0,
                latency: None,
            },
            0,
        ))
    }

    fn backoff() -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .base_delay(Duration::from_millis(1))
            .max_delay(Duration::from_millis(5))
            .jitter(JitterStrategy::None)
            .build()
    }

    fn task() -> WorkerTask {
        WorkerTask::new("load_test", vec![vec![SqlValue::Integer(1)]], 3)
    }

    #[tokio::test]
    async fn test_pool_drains_task_source() {
        let store = clean_store();
        let pool = WorkerPool::new(Arc::clone(&store), backoff(), 4).with_seed(7);
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = shutdown_signal();

        let producer = tokio::spawn(async move {
            for _ in 0..20 {
                tx.send(task()).await.expect("pool should be receiving");
            }
        });

        let summary = pool.run(rx, shutdown_rx).await;
        producer.await.expect("producer should finish");

        assert_eq!(summary.succeeded, 20);
        assert_eq!(summary.attempts, 20);
        assert_eq!(summary.dead_lettered, 0);
        assert_eq!(summary.cancelled, 0);
        assert_eq!(store.batches_accepted(), 20);
    }

    #[tokio::test]
    async fn test_pre_signaled_shutdown_pulls_nothing() {
        let store = clean_store();
        let pool = WorkerPool::new(store, backoff(), 2);
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = shutdown_signal();

        for _ in 0..4 {
            tx.try_send(task()).expect("channel has room");
        }
        shutdown_tx.send(true).expect("send shutdown");

        let summary = pool.run(rx, shutdown_rx).await;
        assert_eq!(summary.total_tasks(), 0);
    }
}
