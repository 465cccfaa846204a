//! Load-run configuration.

use occload_core::retry::{ExponentialBackoff, JitterStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors surfaced before any worker starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// `threads` was zero.
    #[error("threads must be positive")]
    ZeroThreads,

    /// `batch_size` was zero.
    #[error("batch_size must be positive")]
    ZeroBatchSize,

    /// `max_attempts` was zero.
    #[error("max_attempts must be positive")]
    ZeroMaxAttempts,

    /// `base_delay_ms` was zero.
    #[error("base_delay_ms must be positive")]
    ZeroBaseDelay,

    /// The delay cap was below the base delay.
    #[error("max_delay_ms ({max_delay_ms}) must be at least base_delay_ms ({base_delay_ms})")]
    CapBelowBase {
        /// Configured base delay.
        base_delay_ms: u64,
        /// Configured cap.
        max_delay_ms: u64,
    },

    /// The growth factor would not actually grow.
    #[error("growth_factor must be greater than 1, got {0}")]
    GrowthFactorTooSmall(f64),

    /// The table name was empty.
    #[error("table must not be empty")]
    EmptyTable,
}

/// Recognized options for a load run.
///
/// Durations are carried as whole milliseconds so the struct deserializes
/// from flat config sources without custom formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Target table name.
    pub table: String,
    /// Worker concurrency.
    pub threads: usize,
    /// Rows per batch.
    pub batch_size: usize,
    /// Number of batches to enqueue for the run.
    pub tasks: usize,
    /// Executions allowed per task, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay_ms: u64,
    /// Cap applied to every computed delay.
    pub max_delay_ms: u64,
    /// Exponential growth applied per attempt.
    pub growth_factor: f64,
    /// How computed delays are randomized.
    pub jitter_strategy: JitterStrategy,
    /// Seed for jitter and data generation; omit for a fresh seed per run.
    pub random_seed: Option<u64>,
    /// Overall per-task deadline past creation, if any.
    pub task_deadline_ms: Option<u64>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            table: "load_test".to_string(),
            threads: 4,
            batch_size: 1000,
            tasks: 100,
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            growth_factor: 2.0,
            jitter_strategy: JitterStrategy::default(),
            random_seed: None,
            task_deadline_ms: None,
        }
    }
}

impl LoadConfig {
    /// Reject configurations no run should start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if self.base_delay_ms == 0 {
            return Err(ConfigError::ZeroBaseDelay);
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigError::CapBelowBase {
                base_delay_ms: self.base_delay_ms,
                max_delay_ms: self.max_delay_ms,
            });
        }
        if self.growth_factor <= 1.0 {
            return Err(ConfigError::GrowthFactorTooSmall(self.growth_factor));
        }
        if self.table.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        Ok(())
    }

    /// The backoff calculator these options describe.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .growth_factor(self.growth_factor)
            .jitter(self.jitter_strategy)
            .build()
    }

    /// The per-task deadline, if configured.
    pub fn task_deadline(&self) -> Option<Duration> {
        self.task_deadline_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LoadConfig::default();
        assert_eq!(config.threads, 4);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.jitter_strategy, JitterStrategy::Equal);
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn test_rejects_zero_values() {
        for broken in [
            LoadConfig {
                threads: 0,
                ..Default::default()
            },
            LoadConfig {
                batch_size: 0,
                ..Default::default()
            },
            LoadConfig {
                max_attempts: 0,
                ..Default::default()
            },
            LoadConfig {
                base_delay_ms: 0,
                ..Default::default()
            },
        ] {
            assert!(broken.validate().is_err());
        }
    }

    #[test]
    fn test_rejects_cap_below_base() {
        let config = LoadConfig {
            base_delay_ms: 2_000,
            max_delay_ms: 500,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CapBelowBase {
                base_delay_ms: 2_000,
                max_delay_ms: 500,
            })
        );
    }

    #[test]
    fn test_rejects_non_growing_factor() {
        let config = LoadConfig {
            growth_factor: 1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::GrowthFactorTooSmall(1.0))
        );
    }

    #[test]
    fn test_backoff_carries_options() {
        let config = LoadConfig {
            base_delay_ms: 250,
            max_delay_ms: 4_000,
            growth_factor: 3.0,
            jitter_strategy: JitterStrategy::None,
            ..Default::default()
        };
        let backoff = config.backoff();
        assert_eq!(backoff.base_delay(), Duration::from_millis(250));
        assert_eq!(backoff.max_delay(), Duration::from_secs(4));
        assert_eq!(backoff.growth_factor(), 3.0);
        assert_eq!(backoff.jitter(), JitterStrategy::None);
    }
}
