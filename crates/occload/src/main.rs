//! occload - concurrent batch-write load generator with OCC-aware retries.

use anyhow::Result;
use clap::Parser;
use occload::config::LoadConfig;
use occload::generate::DataGenerator;
use occload::pool::{WorkerPool, shutdown_signal};
use occload::task::WorkerTask;
use occload_core::retry::JitterStrategy;
use occload_store::{FaultProfile, SimulatedStore};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit code when at least one task was dead-lettered.
const EXIT_DEAD_LETTERED: u8 = 1;
/// Exit code when operator-initiated shutdown cancelled tasks.
const EXIT_CANCELLED: u8 = 130;

#[derive(Parser, Debug)]
#[command(
    name = "occload",
    version,
    about = "Generate concurrent batch-write load and retry through OCC conflicts"
)]
struct Cli {
    /// Target table name.
    #[arg(long, default_value = "load_test")]
    table: String,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Rows per batch.
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Number of batches to enqueue for the run.
    #[arg(long, default_value_t = 100)]
    tasks: usize,

    /// Executions allowed per task, the first one included.
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    /// Delay after the first failed attempt, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    base_delay_ms: u64,

    /// Cap applied to every computed delay, in milliseconds.
    #[arg(long, default_value_t = 30_000)]
    max_delay_ms: u64,

    /// Exponential growth factor applied per attempt.
    #[arg(long, default_value_t = 2.0)]
    growth_factor: f64,

    /// Jitter strategy: none, full, or equal.
    #[arg(long, default_value_t = JitterStrategy::Equal)]
    jitter_strategy: JitterStrategy,

    /// Seed for reproducible jitter and payload; omitted means a fresh
    /// seed each run.
    #[arg(long)]
    random_seed: Option<u64>,

    /// Overall per-task deadline past creation, in milliseconds.
    #[arg(long)]
    task_deadline_ms: Option<u64>,

    /// Probability that the simulated store reports an OCC conflict.
    #[arg(long, default_value_t = 0.2)]
    conflict_rate: f64,

    /// Probability that the simulated store reports a fatal error.
    #[arg(long, default_value_t = 0.0)]
    fatal_rate: f64,

    /// Simulated per-call store latency, in milliseconds.
    #[arg(long)]
    store_latency_ms: Option<u64>,
}

impl Cli {
    fn load_config(&self) -> LoadConfig {
        LoadConfig {
            table: self.table.clone(),
            threads: self.threads,
            batch_size: self.batch_size,
            tasks: self.tasks,
            max_attempts: self.max_attempts,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            growth_factor: self.growth_factor,
            jitter_strategy: self.jitter_strategy,
            random_seed: self.random_seed,
            task_deadline_ms: self.task_deadline_ms,
        }
    }

    fn fault_profile(&self) -> FaultProfile {
        FaultProfile {
            conflict_rate: self.conflict_rate,
            fatal_rate: self.fatal_rate,
            latency: self.store_latency_ms.map(Duration::from_millis),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config();
    config.validate()?;

    let seed = config.random_seed.unwrap_or_else(rand::random);
    info!(
        table = %config.table,
        threads = config.threads,
        batch_size = config.batch_size,
        tasks = config.tasks,
        max_attempts = config.max_attempts,
        jitter = %config.jitter_strategy,
        seed,
        "starting load run"
    );

    let store = Arc::new(SimulatedStore::new(cli.fault_profile(), seed));
    let pool = WorkerPool::new(Arc::clone(&store), config.backoff(), config.threads)
        .with_seed(seed);

    let (shutdown_tx, shutdown_rx) = shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let (task_tx, task_rx) = mpsc::channel(config.threads * 2);
    let producer = tokio::spawn(produce_tasks(config.clone(), seed, task_tx, shutdown_rx.clone()));

    let summary = pool.run(task_rx, shutdown_rx).await;
    if let Err(error) = producer.await {
        warn!(%error, "task producer terminated abnormally");
    }

    info!(
        succeeded = summary.succeeded,
        dead_lettered = summary.dead_lettered,
        cancelled = summary.cancelled,
        attempts = summary.attempts,
        batches_accepted = store.batches_accepted(),
        rows_accepted = store.rows_accepted(),
        "load run complete"
    );

    if summary.cancelled > 0 {
        Ok(ExitCode::from(EXIT_CANCELLED))
    } else if summary.dead_lettered > 0 {
        Ok(ExitCode::from(EXIT_DEAD_LETTERED))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Enqueue the run's batches, stopping early on shutdown or when the pool
/// is gone.
async fn produce_tasks(
    config: LoadConfig,
    seed: u64,
    task_tx: mpsc::Sender<WorkerTask>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut generator = DataGenerator::new(DataGenerator::default_layout(), seed);

    for _ in 0..config.tasks {
        let rows = generator.batch(config.batch_size);
        let mut task = WorkerTask::new(config.table.as_str(), rows, config.max_attempts);
        if let Some(deadline) = config.task_deadline() {
            task = task.with_deadline(deadline);
        }

        tokio::select! {
            sent = task_tx.send(task) => {
                if sent.is_err() {
                    return;
                }
            }
            _ = shutdown.wait_for(|stop| *stop) => return,
        }
    }
}
