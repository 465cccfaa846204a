//! The worker-task state machine.
//!
//! One task is one batch of rows destined for one table. A worker drives it
//! through attempts, classification, backoff sleeps, and exactly one
//! terminal transition:
//!
//! ```text
//! Pending -> Executing -> Succeeded
//!                      -> (classify) -> Sleeping -> Pending(attempt+1)
//!                                    -> DeadLettered
//! shutdown before an attempt or during a sleep -> Cancelled
//! ```
//!
//! A task is owned exclusively by the worker driving it; nothing here is
//! shared or locked.

use crate::deadletter::{DeadLetterRecord, DeadLetterSink};
use chrono::{DateTime, Utc};
use occload_core::retry::{ExponentialBackoff, RetryPolicy};
use occload_store::{ErrorClassification, Row, StoreClient, classify};
use rand::Rng;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// States a task moves through. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for its next (or first) execution.
    Pending,
    /// The batch write is in flight.
    Executing,
    /// Waiting out a backoff delay before the next attempt.
    Sleeping,
    /// The batch was accepted. Terminal.
    Succeeded,
    /// Retries exhausted or the failure was unrecoverable. Terminal.
    DeadLettered,
    /// Interrupted by shutdown before completing. Terminal.
    Cancelled,
}

impl TaskState {
    /// Whether no further transitions may leave this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::DeadLettered | Self::Cancelled)
    }
}

/// How driving a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The batch was accepted on the counted attempt.
    Success {
        /// Executions consumed, including the successful one.
        attempts: u32,
    },
    /// The task was handed to the dead-letter sink.
    DeadLettered {
        /// Executions consumed before giving up.
        attempts: u32,
    },
    /// Shutdown interrupted the task.
    Cancelled {
        /// Fully executed attempts; the interrupted one is not counted.
        attempts_completed: u32,
    },
}

impl TaskOutcome {
    /// Executions this task consumed.
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Success { attempts } | Self::DeadLettered { attempts } => attempts,
            Self::Cancelled { attempts_completed } => attempts_completed,
        }
    }
}

/// One logical unit of batch work.
#[derive(Debug, Clone)]
pub struct WorkerTask {
    id: Uuid,
    table: String,
    rows: Vec<Row>,
    attempt: u32,
    max_attempts: u32,
    created_at: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    state: TaskState,
    last_error: Option<String>,
}

impl WorkerTask {
    /// Create a task carrying `rows` for `table`. `max_attempts` counts
    /// executions, is fixed for the task's lifetime, and is clamped to at
    /// least 1.
    pub fn new(table: impl Into<String>, rows: Vec<Row>, max_attempts: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            table: table.into(),
            rows,
            attempt: 1,
            max_attempts: max_attempts.max(1),
            created_at: Utc::now(),
            deadline: None,
            state: TaskState::Pending,
            last_error: None,
        }
    }

    /// Give the task an overall deadline of `max_elapsed` past creation.
    /// Exceeding it dead-letters the task regardless of remaining budget.
    pub fn with_deadline(mut self, max_elapsed: Duration) -> Self {
        self.deadline = Some(self.created_at + max_elapsed);
        self
    }

    /// The task's id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Target table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The rows this task carries.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The attempt the next execution would carry (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The fixed execution budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// When the task was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// The most recent error, rendered, if any attempt has failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn deadline_exceeded(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    fn transition(&mut self, next: TaskState) {
        debug_assert!(
            !self.state.is_terminal(),
            "no transitions leave a terminal state"
        );
        self.state = next;
    }
}

/// Drive a task to a terminal state.
///
/// The worker owns the task for the whole call; the only suspension points
/// are the store call and the backoff sleep, and no other resource is held
/// across either. The shutdown channel is consulted before every attempt
/// and interrupts any sleep; a closed channel counts as a stop signal.
pub async fn drive<S, R>(
    mut task: WorkerTask,
    store: &S,
    backoff: &ExponentialBackoff,
    rng: &mut R,
    shutdown: &mut watch::Receiver<bool>,
    sink: &DeadLetterSink,
) -> TaskOutcome
where
    S: StoreClient + ?Sized,
    R: Rng + ?Sized,
{
    let policy = RetryPolicy::new(backoff.clone(), task.max_attempts);

    loop {
        if *shutdown.borrow() {
            let attempts_completed = task.attempt - 1;
            return cancel(task, attempts_completed);
        }
        if task.deadline_exceeded(Utc::now()) {
            let attempts_made = task.attempt - 1;
            warn!(
                task_id = %task.id,
                attempts_made,
                outcome = "dead_letter",
                "task deadline exceeded"
            );
            return dead_letter(
                task,
                sink,
                ErrorClassification::Fatal {
                    reason: "task deadline exceeded".to_string(),
                },
                "task deadline exceeded".to_string(),
                attempts_made,
            );
        }

        task.transition(TaskState::Executing);
        let attempt = task.attempt;
        match store.execute_batch(&task.table, &task.rows).await {
            Ok(()) => {
                info!(
                    task_id = %task.id,
                    attempt,
                    rows = task.rows.len(),
                    outcome = "success",
                    "batch write succeeded"
                );
                task.transition(TaskState::Succeeded);
                return TaskOutcome::Success { attempts: attempt };
            }
            Err(error) => {
                let classification = classify(&error);
                task.last_error = Some(error.to_string());

                let decision = policy.decide(attempt, classification.is_retryable(), rng);
                if !decision.should_retry {
                    warn!(
                        task_id = %task.id,
                        attempt,
                        classification = %classification,
                        delay_ms = 0_u64,
                        outcome = "dead_letter",
                        %error,
                        "batch write failed permanently"
                    );
                    return dead_letter(task, sink, classification, error.to_string(), attempt);
                }

                debug!(
                    task_id = %task.id,
                    attempt,
                    classification = %classification,
                    delay_ms = decision.delay.as_millis() as u64,
                    outcome = "retry",
                    "batch write failed, backing off"
                );
                task.transition(TaskState::Sleeping);
                tokio::select! {
                    () = tokio::time::sleep(decision.delay) => {}
                    _ = shutdown.wait_for(|stop| *stop) => {
                        // The interrupted attempt never started.
                        return cancel(task, attempt);
                    }
                }
                task.transition(TaskState::Pending);
                task.attempt = decision.next_attempt;
            }
        }
    }
}

fn cancel(mut task: WorkerTask, attempts_completed: u32) -> TaskOutcome {
    info!(
        task_id = %task.id,
        attempts_completed,
        outcome = "cancelled",
        "shutdown interrupted task"
    );
    task.transition(TaskState::Cancelled);
    TaskOutcome::Cancelled { attempts_completed }
}

fn dead_letter(
    mut task: WorkerTask,
    sink: &DeadLetterSink,
    classification: ErrorClassification,
    error: String,
    attempts_made: u32,
) -> TaskOutcome {
    task.transition(TaskState::DeadLettered);
    sink.record(DeadLetterRecord {
        task_id: task.id,
        table: task.table,
        rows: task.rows,
        classification,
        error,
        attempts_made,
        recorded_at: Utc::now(),
    });
    TaskOutcome::DeadLettered {
        attempts: attempts_made,
    }
}
