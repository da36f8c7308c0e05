//! Scheduler and per-task schedule configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reliability::{RetryPolicy, TimeoutConfig};
use crate::task::TaskOutcome;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Unique scheduler ID (generated if not provided)
    pub scheduler_id: String,

    /// Graceful shutdown timeout
    #[serde(with = "crate::reliability::duration_millis")]
    pub shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduler_id: format!("scheduler-{}", Uuid::now_v7()),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl SchedulerConfig {
    /// Create a new scheduler configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduler ID
    pub fn with_scheduler_id(mut self, id: impl Into<String>) -> Self {
        self.scheduler_id = id.into();
        self
    }

    /// Set shutdown timeout
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// How often and how persistently one task runs
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use venuewatch_tasks::{RetryPolicy, TaskSchedule};
///
/// let schedule = TaskSchedule::every(Duration::from_secs(900))
///     .with_unavailable_retry_interval(Duration::from_secs(60))
///     .with_retry_policy(RetryPolicy::exponential());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSchedule {
    /// Delay between successful invocations
    #[serde(with = "crate::reliability::duration_millis")]
    pub interval: Duration,

    /// Backoff after failed invocations (never longer than `interval`)
    pub retry_policy: RetryPolicy,

    /// Delay after a deferral because the host was unavailable
    #[serde(with = "crate::reliability::duration_millis")]
    pub unavailable_retry_interval: Duration,

    /// Time limits handed to each invocation
    pub timeouts: TimeoutConfig,

    /// Run once as soon as the scheduler starts
    pub run_immediately: bool,
}

impl TaskSchedule {
    /// Run every `interval`, with default retry and timeout settings
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            retry_policy: RetryPolicy::default(),
            unavailable_retry_interval: Duration::from_secs(60),
            timeouts: TimeoutConfig::default(),
            run_immediately: true,
        }
    }

    /// Set the failure backoff
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the delay after an unavailable host
    pub fn with_unavailable_retry_interval(mut self, interval: Duration) -> Self {
        self.unavailable_retry_interval = interval;
        self
    }

    /// Set invocation time limits
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Wait a full interval before the first run
    pub fn delayed_start(mut self) -> Self {
        self.run_immediately = false;
        self
    }

    /// Delay before the first invocation
    pub fn initial_delay(&self) -> Duration {
        if self.run_immediately {
            Duration::ZERO
        } else {
            self.interval
        }
    }

    /// Delay before the next invocation, given the last outcome
    pub fn next_delay(&self, outcome: &TaskOutcome, consecutive_failures: u32) -> Duration {
        match outcome {
            TaskOutcome::Success => self.interval,
            TaskOutcome::Retry => self.unavailable_retry_interval,
            TaskOutcome::Failure { .. } => self
                .retry_policy
                .delay_after_failures(consecutive_failures)
                .min(self.interval),
        }
    }
}
