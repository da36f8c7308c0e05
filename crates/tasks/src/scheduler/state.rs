//! Per-task run bookkeeping

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::TaskOutcome;

/// What the scheduler remembers about a task between invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskRunState {
    /// Total invocations
    pub runs: u64,
    /// Outcome of the most recent invocation
    pub last_outcome: Option<TaskOutcome>,
    /// Start of the most recent invocation
    pub last_run_at: Option<DateTime<Utc>>,
    /// Start of the most recent successful invocation
    pub last_success_at: Option<DateTime<Utc>>,
    /// Failures since the last success
    pub consecutive_failures: u32,
    /// Deferrals since the last non-deferred outcome
    pub consecutive_retries: u32,
}

impl TaskRunState {
    /// Fold one outcome into the state
    ///
    /// Deferrals leave the failure count untouched.
    pub fn record(&mut self, outcome: &TaskOutcome, started_at: DateTime<Utc>) {
        self.runs += 1;
        self.last_run_at = Some(started_at);

        match outcome {
            TaskOutcome::Success => {
                self.consecutive_failures = 0;
                self.consecutive_retries = 0;
                self.last_success_at = Some(started_at);
            }
            TaskOutcome::Retry => {
                self.consecutive_retries = self.consecutive_retries.saturating_add(1);
            }
            TaskOutcome::Failure { .. } => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.consecutive_retries = 0;
            }
        }

        self.last_outcome = Some(outcome.clone());
    }
}
