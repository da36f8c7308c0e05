//! Invocation timeout configuration
//!
//! A scheduler hands every invocation a budget. Payloads spend it across
//! their suspension points, each of which is additionally capped by the
//! per-request limit.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeout configuration for task invocations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum time from start to completion of one invocation
    #[serde(with = "crate::reliability::duration_millis")]
    pub invocation: Duration,

    /// Maximum time for a single remote call inside the invocation
    #[serde(with = "crate::reliability::duration_millis")]
    pub request: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            invocation: Duration::from_secs(300), // 5 minutes per invocation
            request: Duration::from_secs(30),     // 30 seconds per remote call
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the invocation budget
    pub fn with_invocation(mut self, timeout: Duration) -> Self {
        self.invocation = timeout;
        self
    }

    /// Set the per-request limit
    pub fn with_request(mut self, timeout: Duration) -> Self {
        self.request = timeout;
        self
    }
}
