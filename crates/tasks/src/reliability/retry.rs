//! Failure backoff for recurring tasks

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Backoff applied by the scheduler after a failed invocation
///
/// Background tasks are never abandoned: once the backoff reaches
/// `max_interval` it stays there until an invocation succeeds. Deferrals
/// (`TaskOutcome::Retry`) do not go through this policy.
///
/// # Example
///
/// ```
/// use venuewatch_tasks::RetryPolicy;
/// use std::time::Duration;
///
/// // 30s, 60s, 120s, ... up to an hour between failed polls
/// let policy = RetryPolicy::exponential()
///     .with_initial_interval(Duration::from_secs(30))
///     .with_max_interval(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Delay after the first failure
    #[serde(with = "crate::reliability::duration_millis")]
    pub initial_interval: Duration,

    /// Ceiling for the delay
    #[serde(with = "crate::reliability::duration_millis")]
    pub max_interval: Duration,

    /// Growth factor per additional failure (>= 1.0)
    pub backoff_coefficient: f64,

    /// Relative spread applied to each delay, in `0.0..=1.0`
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl RetryPolicy {
    /// Doubling backoff from 30s up to 1h with 10% jitter
    pub fn exponential() -> Self {
        Self {
            initial_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(60 * 60),
            backoff_coefficient: 2.0,
            jitter: 0.1,
        }
    }

    /// Same delay after every failure
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            backoff_coefficient: 1.0,
            jitter: 0.0,
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the growth factor (values below 1.0 are raised to 1.0)
    pub fn with_backoff_coefficient(mut self, coefficient: f64) -> Self {
        self.backoff_coefficient = coefficient.max(1.0);
        self
    }

    /// Set the jitter (clamped to `0.0..=1.0`)
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay before the next attempt after `consecutive_failures` failures in a row
    pub fn delay_after_failures(&self, consecutive_failures: u32) -> Duration {
        let Some(extra_failures) = consecutive_failures.checked_sub(1) else {
            return Duration::ZERO;
        };

        // Past 2^30 the ceiling always wins
        let growth = self.backoff_coefficient.powi(extra_failures.min(30) as i32);
        // Deserialized policies bypass the builder clamps
        let delay = (self.initial_interval.as_secs_f64() * growth)
            .min(self.max_interval.as_secs_f64())
            .max(0.0);

        let jitter = if self.jitter.is_finite() {
            self.jitter.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if jitter == 0.0 || delay == 0.0 {
            return Duration::from_secs_f64(delay);
        }

        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
        Duration::from_secs_f64((delay * factor).max(0.0))
    }
}
