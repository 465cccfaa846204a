//! Backoff calculation and retry decisions.
//!
//! # Key Types
//!
//! - [`ExponentialBackoff`] - capped exponential delay with jitter
//! - [`JitterStrategy`] - how randomness is applied to a computed delay
//! - [`RetryPolicy`] - backoff plus an attempt budget
//! - [`RetryDecision`] - the verdict for a single failed attempt
//!
//! # Examples
//!
//! ```rust
//! use occload_core::retry::{ExponentialBackoff, JitterStrategy, RetryPolicy};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(
//!     ExponentialBackoff::builder()
//!         .base_delay(Duration::from_millis(100))
//!         .jitter(JitterStrategy::None)
//!         .build(),
//!     5,
//! );
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let decision = policy.decide(1, true, &mut rng);
//! assert!(decision.should_retry);
//! assert_eq!(decision.next_attempt, 2);
//! ```

mod backoff;
mod policy;

pub use backoff::{ExponentialBackoff, ExponentialBackoffBuilder, JitterStrategy};
pub use policy::{RetryDecision, RetryPolicy};
