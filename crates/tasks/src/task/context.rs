//! Task invocation context

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::TaskKind;
use crate::reliability::TimeoutConfig;

/// Why a bounded operation did not complete
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Interruption {
    /// The invocation was cancelled (scheduler shutdown or budget exhausted)
    #[error("invocation was cancelled")]
    Cancelled,

    /// The operation ran past its time limit
    #[error("operation timed out after {limit:?}")]
    TimedOut { limit: Duration },
}

/// Context provided to tasks for one invocation
///
/// The context provides:
/// - Identity of the invocation and the task being run
/// - The consecutive attempt number since the last success
/// - The invocation budget and per-request time limits
/// - Cancellation detection
///
/// # Example
///
/// ```ignore
/// async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
///     // Suspension points go through `bounded` so they honor the budget
///     let decision = ctx
///         .bounded(self.remote.fetch())
///         .await
///         .map_err(|e| TaskError::remote(e.to_string()))??;
///
///     apply(decision);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Unique invocation ID
    pub invocation_id: Uuid,

    /// Task being invoked
    pub task_kind: TaskKind,

    /// Consecutive attempt number (1-based, reset after a success)
    pub attempt: u32,

    /// Wall-clock start of the invocation
    pub started_at: DateTime<Utc>,

    /// Time limits for this invocation
    pub timeouts: TimeoutConfig,

    started: Instant,
    cancel: CancellationToken,
}

impl TaskContext {
    /// Create a new context for a first attempt with default time limits
    pub fn new(task_kind: TaskKind) -> Self {
        Self {
            invocation_id: Uuid::now_v7(),
            task_kind,
            attempt: 1,
            started_at: Utc::now(),
            timeouts: TimeoutConfig::default(),
            started: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the attempt number
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt.max(1);
        self
    }

    /// Set the time limits
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Get a token that cancels this invocation when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve when cancellation is requested
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Time elapsed since the invocation started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining invocation budget, `None` once it is spent
    pub fn remaining(&self) -> Option<Duration> {
        self.timeouts.invocation.checked_sub(self.elapsed())
    }

    /// Run a future under this invocation's cancellation and time limits
    ///
    /// The limit is the smaller of the per-request timeout and what is left of
    /// the invocation budget.
    pub async fn bounded<F, T>(&self, fut: F) -> Result<T, Interruption>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Err(Interruption::Cancelled);
        }

        let limit = self
            .remaining()
            .map(|remaining| remaining.min(self.timeouts.request))
            .unwrap_or(Duration::ZERO);

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interruption::Cancelled),
            result = tokio::time::timeout(limit, fut) => {
                result.map_err(|_| Interruption::TimedOut { limit })
            }
        }
    }
}
