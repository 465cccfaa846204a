#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core retry machinery for the occload load generator.
//!
//! This crate holds the pure, runtime-free pieces of the retry engine:
//!
//! - **Backoff calculation** via [`retry::ExponentialBackoff`]
//!   - Exponential growth capped at a maximum delay
//!   - None / full / equal jitter strategies
//!   - Caller-injected randomness, so seeded RNGs reproduce exact sequences
//! - **Retry decisions** via [`retry::RetryPolicy`]
//!   - One decision per failure: retry after a delay, or give up
//!   - Non-retryable failures short-circuit the remaining attempt budget
//!
//! Nothing in this crate sleeps, spawns, or touches a store. The worker
//! state machine that acts on these decisions lives in the `occload` crate.
//!
//! # Examples
//!
//! ```rust
//! use occload_core::prelude::*;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::builder()
//!     .base_delay(Duration::from_secs(1))
//!     .max_delay(Duration::from_secs(30))
//!     .growth_factor(2.0)
//!     .jitter(JitterStrategy::None)
//!     .build();
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! assert_eq!(backoff.delay(3, &mut rng), Duration::from_secs(4));
//! ```

pub mod retry;

/// Convenient re-exports of commonly used items.
pub mod prelude {
    pub use crate::retry::{
        ExponentialBackoff, ExponentialBackoffBuilder, JitterStrategy, RetryDecision, RetryPolicy,
    };
}
