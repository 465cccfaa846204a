//! Tasks that keep failing retry until the budget is gone, then dead-letter.

use chrono::{DateTime, TimeDelta, Utc};
use occload::deadletter::DeadLetterSink;
use occload::pool::{WorkerPool, shutdown_signal};
use occload::task::{TaskOutcome, WorkerTask, drive};
use occload_core::retry::{ExponentialBackoff, JitterStrategy};
use occload_store::{SimulatedStore, SqlValue, StoreError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

fn fast_backoff() -> ExponentialBackoff {
    ExponentialBackoff::builder()
        .base_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(8))
        .jitter(JitterStrategy::None)
        .build()
}

fn rows() -> Vec<Vec<SqlValue>> {
    vec![vec![
        SqlValue::Integer(7),
        SqlValue::Text("user_7@test.com".into()),
    ]]
}

fn conflict() -> StoreError {
    StoreError::OccConflict {
        table: "load_test".into(),
        detail: "row version changed".into(),
    }
}

fn all_records(sink: &DeadLetterSink) -> Vec<occload::deadletter::DeadLetterRecord> {
    sink.query_range(
        DateTime::<Utc>::MIN_UTC,
        Utc::now() + TimeDelta::seconds(1),
    )
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_consumes_exactly_max_attempts() {
    let store = SimulatedStore::scripted((0..5).map(|_| Some(conflict())));
    let sink = DeadLetterSink::new();
    let (_tx, mut shutdown) = watch::channel(false);
    let mut rng = StdRng::seed_from_u64(0);

    let outcome = drive(
        WorkerTask::new("load_test", rows(), 5),
        &store,
        &fast_backoff(),
        &mut rng,
        &mut shutdown,
        &sink,
    )
    .await;

    assert_eq!(outcome, TaskOutcome::DeadLettered { attempts: 5 });

    // The script held exactly five conflicts; a sixth attempt would have
    // been accepted and counted.
    assert_eq!(store.batches_accepted(), 0);

    let records = all_records(&sink);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].attempts_made, 5);
    assert!(records[0].classification.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_error_short_circuits_remaining_budget() {
    let store = SimulatedStore::scripted(vec![Some(StoreError::Other {
        code: "XX000".into(),
        message: "internal error".into(),
    })]);
    let sink = DeadLetterSink::new();
    let (_tx, mut shutdown) = watch::channel(false);
    let mut rng = StdRng::seed_from_u64(0);

    let outcome = drive(
        WorkerTask::new("load_test", rows(), 5),
        &store,
        &fast_backoff(),
        &mut rng,
        &mut shutdown,
        &sink,
    )
    .await;

    assert_eq!(outcome, TaskOutcome::DeadLettered { attempts: 1 });
    assert_eq!(all_records(&sink)[0].attempts_made, 1);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_workload_records_each_failed_task_once() {
    // One worker, so the scripted outcomes line up with task order:
    // task 1 hits a fatal constraint, task 2 succeeds, task 3 conflicts
    // through its whole budget of 3.
    let mut script: Vec<Option<StoreError>> = vec![
        Some(StoreError::ConstraintViolation {
            table: "load_test".into(),
            detail: "unique_email".into(),
        }),
        None,
    ];
    script.extend((0..3).map(|_| Some(conflict())));

    let store = Arc::new(SimulatedStore::scripted(script));
    let pool = WorkerPool::new(Arc::clone(&store), fast_backoff(), 1).with_seed(1);
    let sink = pool.sink();

    let (task_tx, task_rx) = mpsc::channel(8);
    for _ in 0..3 {
        task_tx
            .try_send(WorkerTask::new("load_test", rows(), 3))
            .expect("channel has room");
    }
    drop(task_tx);

    let (_shutdown_tx, shutdown_rx) = shutdown_signal();
    let summary = pool.run(task_rx, shutdown_rx).await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.dead_lettered, 2);
    assert_eq!(summary.cancelled, 0);
    assert_eq!(summary.attempts, 1 + 1 + 3);

    let records = all_records(&sink);
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].task_id, records[1].task_id);
}
