//! Retry decisions over an attempt budget.

use super::backoff::ExponentialBackoff;
use rand::Rng;
use std::time::Duration;

/// The verdict for a single failed attempt.
///
/// Produced fresh per failure and never persisted; the worker either sleeps
/// for `delay` and re-executes as `next_attempt`, or finalizes the task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryDecision {
    /// Whether the attempt should be retried at all.
    pub should_retry: bool,
    /// How long to sleep before the next attempt. Zero when not retrying.
    pub delay: Duration,
    /// The attempt number the next execution would carry.
    pub next_attempt: u32,
}

impl RetryDecision {
    fn give_up(attempt: u32) -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
            next_attempt: attempt,
        }
    }
}

/// A backoff calculator paired with an attempt budget.
///
/// `decide` is the single entry point the worker state machine uses after a
/// failed attempt. Attempt numbers are 1-based and bounded by
/// `max_attempts`; a non-retryable failure gives up immediately no matter
/// how much budget remains.
///
/// # Examples
///
/// ```rust
/// use occload_core::retry::{ExponentialBackoff, JitterStrategy, RetryPolicy};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(
///     ExponentialBackoff::builder()
///         .base_delay(Duration::from_secs(1))
///         .jitter(JitterStrategy::None)
///         .build(),
///     3,
/// );
/// let mut rng = StdRng::seed_from_u64(0);
///
/// assert!(policy.decide(2, true, &mut rng).should_retry);
/// // budget exhausted at attempt == max_attempts
/// assert!(!policy.decide(3, true, &mut rng).should_retry);
/// // fatal classifications short-circuit regardless of budget
/// assert!(!policy.decide(1, false, &mut rng).should_retry);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    max_attempts: u32,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts executions, not retries, and
    /// is clamped to at least 1.
    pub fn new(backoff: ExponentialBackoff, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The total number of executions a task may consume.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The underlying backoff calculator.
    pub fn backoff(&self) -> &ExponentialBackoff {
        &self.backoff
    }

    /// Decide what happens after attempt `attempt` failed.
    ///
    /// `retryable` is the classifier's verdict on the failure; anything not
    /// positively retryable gives up on the spot so no budget is wasted on
    /// conditions that cannot succeed.
    pub fn decide<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        retryable: bool,
        rng: &mut R,
    ) -> RetryDecision {
        if !retryable || attempt >= self.max_attempts {
            return RetryDecision::give_up(attempt);
        }
        RetryDecision {
            should_retry: true,
            delay: self.backoff.delay(attempt, rng),
            next_attempt: attempt + 1,
        }
    }
}
