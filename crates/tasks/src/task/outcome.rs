//! Scheduler-facing task outcome

use serde::{Deserialize, Serialize};

/// Result of a single task invocation, as seen by the scheduler
///
/// ```text
///              ┌──────────┐
///              │ invoked  │
///              └────┬─────┘
///     unavailable   │   available
///        ┌──────────┴──────────┐
///        ▼                     ▼
///   ┌─────────┐        payload ok / err
///   │  Retry  │        ┌───────┴───────┐
///   └─────────┘        ▼               ▼
///                 ┌─────────┐     ┌─────────┐
///                 │ Success │     │ Failure │
///                 └─────────┘     └─────────┘
/// ```
///
/// `Retry` is a deferral, not an error: schedulers must not count it towards
/// failure-based alerting or backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The host could not run the task right now
    Retry,

    /// The payload ran to completion
    Success,

    /// The payload ran and failed; the scheduler should back off and retry
    Failure {
        /// Human-readable failure reason
        reason: String,
    },
}

impl TaskOutcome {
    /// Create a failure outcome
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Check if this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if this is a deferral
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry)
    }

    /// Check if this counts as a failure for backoff purposes
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Success => write!(f, "success"),
            Self::Failure { .. } => write!(f, "failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(TaskOutcome::Success.is_success());
        assert!(TaskOutcome::Retry.is_retry());
        assert!(TaskOutcome::failure("boom").is_failure());
        assert!(!TaskOutcome::Retry.is_failure());
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskOutcome::Retry.to_string(), "retry");
        assert_eq!(TaskOutcome::Success.to_string(), "success");
        assert_eq!(TaskOutcome::failure("x").to_string(), "failure");
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(TaskOutcome::failure("remote down")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"outcome": "failure", "reason": "remote down"})
        );
    }
}
