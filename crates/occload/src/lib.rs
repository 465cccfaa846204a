#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Concurrent batch-write load generator with OCC-aware retry orchestration.
//!
//! Many workers push row batches at a relational store that rejects writes
//! whose schema or row versions changed mid-transaction. The interesting
//! part is not the load itself but what happens when a write fails: each
//! worker classifies the error, decides whether to retry, sleeps a jittered
//! exponential backoff, and routes exhausted or unrecoverable work to a
//! dead-letter sink. Every worker does this independently, without sharing
//! any retry state.
//!
//! # Architecture
//!
//! - [`task`]: the per-task state machine (attempts, sleeps, terminal
//!   outcomes, cancellation)
//! - [`pool`]: N workers over a shared task source with cooperative
//!   shutdown
//! - [`deadletter`]: append-only record of work that could not complete
//! - [`metrics`]: pool-wide atomic counters
//! - [`config`]: recognized options and validation
//! - [`generate`]: seeded random row batches
//!
//! Backoff math lives in `occload-core`; the store boundary and error
//! classification live in `occload-store`.

pub mod config;
pub mod deadletter;
pub mod generate;
pub mod metrics;
pub mod pool;
pub mod task;

// Re-export commonly used types
pub use config::{ConfigError, LoadConfig};
pub use deadletter::{DeadLetterRecord, DeadLetterSink};
pub use generate::{ColumnType, DataGenerator};
pub use metrics::{PoolMetrics, PoolSummary};
pub use pool::WorkerPool;
pub use task::{TaskOutcome, TaskState, WorkerTask};
