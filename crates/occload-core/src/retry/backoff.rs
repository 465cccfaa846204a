//! Exponential backoff with configurable jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How randomness is applied to a capped exponential delay.
///
/// With many workers retrying the same conflicting write, undithered delays
/// re-collide on the next attempt. The strategies trade a predictable growth
/// floor against the degree of desynchronization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterStrategy {
    /// No randomization; the capped delay is used as-is.
    None,
    /// Uniform over `[0, capped]`. Maximizes desynchronization at the cost
    /// of occasionally retrying almost immediately.
    Full,
    /// `capped/2` plus uniform over `[0, capped/2]`. Keeps half the
    /// exponential growth as a floor while still spreading retries.
    #[default]
    Equal,
}

impl fmt::Display for JitterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Full => write!(f, "full"),
            Self::Equal => write!(f, "equal"),
        }
    }
}

impl FromStr for JitterStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "full" => Ok(Self::Full),
            "equal" => Ok(Self::Equal),
            other => Err(format!(
                "unknown jitter strategy '{other}', expected none, full, or equal"
            )),
        }
    }
}

/// Exponential backoff calculator with configurable jitter.
///
/// Delays grow exponentially with the attempt number and are capped:
///
/// ```text
/// capped = min(base_delay * growth_factor^(attempt - 1), max_delay)
/// ```
///
/// Jitter is then applied to `capped` according to the configured
/// [`JitterStrategy`]. Attempt numbers are 1-based: `delay(1, ..)` is the
/// delay after the first failed attempt.
///
/// Randomness is supplied by the caller, never drawn from a global source.
/// A seeded [`rand::rngs::StdRng`] therefore reproduces the exact delay
/// sequence, which the test suites rely on.
///
/// # Examples
///
/// ```rust
/// use occload_core::retry::{ExponentialBackoff, JitterStrategy};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .base_delay(Duration::from_secs(1))
///     .max_delay(Duration::from_secs(30))
///     .growth_factor(2.0)
///     .jitter(JitterStrategy::Equal)
///     .build();
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let delay = backoff.delay(4, &mut rng);
/// // capped component is 8s; equal jitter keeps at least half of it
/// assert!(delay >= Duration::from_secs(4) && delay <= Duration::from_secs(8));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    growth_factor: f64,
    jitter: JitterStrategy,
}

impl Default for ExponentialBackoff {
    /// Defaults: 1s base, 30s cap, doubling growth, equal jitter.
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            growth_factor: 2.0,
            jitter: JitterStrategy::default(),
        }
    }
}

impl ExponentialBackoff {
    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// The capped, pre-jitter delay component for a 1-based attempt number.
    ///
    /// This is the value jitter is applied to; it is monotonically
    /// non-decreasing in `attempt` until the cap is reached.
    pub fn capped(&self, attempt: u32) -> Duration {
        // Large exponents overflow f64 to infinity, which min() brings back
        // down to the cap; the clamp keeps powi's argument in range.
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let raw = self.base_delay.as_secs_f64() * self.growth_factor.powi(exponent);
        Duration::from_secs_f64(raw.min(self.max_delay.as_secs_f64()))
    }

    /// Compute the delay before the next retry of a 1-based attempt number.
    ///
    /// Never exceeds the configured maximum delay, for any strategy.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let capped = self.capped(attempt).as_secs_f64();
        let jittered = match self.jitter {
            JitterStrategy::None => capped,
            JitterStrategy::Full => rng.gen_range(0.0..=capped),
            JitterStrategy::Equal => {
                let half = capped / 2.0;
                half + rng.gen_range(0.0..=half)
            }
        };
        Duration::from_secs_f64(jittered)
    }

    /// The configured base delay.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// The configured maximum delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// The configured growth factor.
    pub fn growth_factor(&self) -> f64 {
        self.growth_factor
    }

    /// The configured jitter strategy.
    pub fn jitter(&self) -> JitterStrategy {
        self.jitter
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// Unset parameters fall back to the defaults (1s base, 30s cap, growth 2.0,
/// equal jitter). Range validation happens at the configuration layer, not
/// here.
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    base_delay: Option<Duration>,
    max_delay: Option<Duration>,
    growth_factor: Option<f64>,
    jitter: Option<JitterStrategy>,
}

impl ExponentialBackoffBuilder {
    /// Set the delay after the first failed attempt.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set the exponential growth factor applied per attempt.
    pub fn growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = Some(factor);
        self
    }

    /// Set the jitter strategy.
    pub fn jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Build the [`ExponentialBackoff`] instance.
    pub fn build(self) -> ExponentialBackoff {
        let defaults = ExponentialBackoff::default();
        ExponentialBackoff {
            base_delay: self.base_delay.unwrap_or(defaults.base_delay),
            max_delay: self.max_delay.unwrap_or(defaults.max_delay),
            growth_factor: self.growth_factor.unwrap_or(defaults.growth_factor),
            jitter: self.jitter.unwrap_or(defaults.jitter),
        }
    }
}
