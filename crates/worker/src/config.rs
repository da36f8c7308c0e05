//! Worker configuration from environment variables

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use venuewatch_circuit_breaker::PollerConfig;
use venuewatch_tasks::{TaskSchedule, TimeoutConfig};

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Worker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerConfig {
    /// Unique worker ID (generated if not provided)
    pub worker_id: String,

    /// Base URL of the circuit-breaker decision API
    pub decision_api_url: String,

    /// Delay between successful polls
    pub poll_interval: Duration,

    /// Time limit for a single decision request
    pub poll_timeout: Duration,

    /// Delay before retrying when the host is unavailable
    pub unavailable_retry_interval: Duration,

    /// Outstanding requests older than this are dropped
    pub max_polling_age: Duration,

    /// Initial host availability
    pub host_available: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", Uuid::now_v7()),
            decision_api_url: "http://127.0.0.1:8080".to_string(),
            poll_interval: Duration::from_secs(900),
            poll_timeout: Duration::from_secs(30),
            unavailable_retry_interval: Duration::from_secs(60),
            max_polling_age: Duration::from_secs(24 * 60 * 60),
            host_available: true,
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `WORKER_ID`: Worker ID (default: `worker-<uuid>`)
    /// - `DECISION_API_URL`: Decision API base URL (default: `http://127.0.0.1:8080`)
    /// - `POLL_INTERVAL_SECS`: Seconds between polls (default: 900)
    /// - `POLL_TIMEOUT_SECS`: Per-request timeout in seconds (default: 30)
    /// - `UNAVAILABLE_RETRY_SECS`: Deferral delay in seconds (default: 60)
    /// - `MAX_POLLING_AGE_HOURS`: Expiry of outstanding requests (default: 24)
    /// - `HOST_AVAILABLE`: Initial availability (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let seconds = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var) {
                Some(value) => parse_positive(var, &value).map(Duration::from_secs),
                None => Ok(default),
            }
        };

        let max_polling_age = match lookup("MAX_POLLING_AGE_HOURS") {
            Some(value) => parse_positive("MAX_POLLING_AGE_HOURS", &value)?
                .checked_mul(3600)
                .map(Duration::from_secs)
                .ok_or_else(|| invalid("MAX_POLLING_AGE_HOURS", &value, "too large"))?,
            None => defaults.max_polling_age,
        };

        let host_available = match lookup("HOST_AVAILABLE") {
            Some(value) => parse_bool("HOST_AVAILABLE", &value)?,
            None => defaults.host_available,
        };

        Ok(Self {
            worker_id: lookup("WORKER_ID").unwrap_or(defaults.worker_id),
            decision_api_url: lookup("DECISION_API_URL").unwrap_or(defaults.decision_api_url),
            poll_interval: seconds("POLL_INTERVAL_SECS", defaults.poll_interval)?,
            poll_timeout: seconds("POLL_TIMEOUT_SECS", defaults.poll_timeout)?,
            unavailable_retry_interval: seconds(
                "UNAVAILABLE_RETRY_SECS",
                defaults.unavailable_retry_interval,
            )?,
            max_polling_age,
            host_available,
        })
    }

    /// Schedule for the circuit-breaker polling task
    pub fn task_schedule(&self) -> TaskSchedule {
        TaskSchedule::every(self.poll_interval)
            .with_unavailable_retry_interval(self.unavailable_retry_interval)
            .with_timeouts(TimeoutConfig::default().with_request(self.poll_timeout))
    }

    /// Poller settings
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig::default().with_max_polling_age(self.max_polling_age)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid(var, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(var, value, &e.to_string())),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(var, value, "expected true or false")),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
