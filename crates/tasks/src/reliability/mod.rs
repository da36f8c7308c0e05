//! Reliability patterns for background tasks
//!
//! This module provides:
//! - [`RetryPolicy`] - Exponential backoff applied after failed invocations
//! - [`TimeoutConfig`] - Invocation budget and per-request limits
//! - [`duration_millis`] - Serde helper storing durations as milliseconds

mod retry;
mod timeout;

pub use retry::RetryPolicy;
pub use timeout::TimeoutConfig;

/// Serde support for `Duration` as whole milliseconds
///
/// Use with `#[serde(with = "venuewatch_tasks::reliability::duration_millis")]`.
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
