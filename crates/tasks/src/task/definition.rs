//! Task trait definitions

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Interruption, TaskContext, TaskOutcome};

/// Stable name of a kind of background task
///
/// Used as the scheduler key and as the telemetry event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskKind(&'static str);

impl TaskKind {
    /// Create a task kind from a static name
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Get the task name
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Class of a payload failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// Network or protocol failure, including timeouts and cancellation
    Remote,

    /// The remote answered with data that could not be used
    MalformedResponse,

    /// Local state could not be read or written
    Local,
}

/// Error type for payload failures
///
/// Every payload failure maps to [`TaskOutcome::Failure`]; the kind only
/// changes how loudly it is logged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskError {
    /// Error message
    pub message: String,

    /// Failure class
    pub kind: TaskErrorKind,
}

impl TaskError {
    /// Create a remote error
    pub fn remote(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::Remote,
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::MalformedResponse,
        }
    }

    /// Create a local-state error
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TaskErrorKind::Local,
        }
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

impl From<Interruption> for TaskError {
    fn from(err: Interruption) -> Self {
        Self::remote(err.to_string())
    }
}

/// The unit of work a gated task performs once the host is available
///
/// # Example
///
/// ```ignore
/// struct RefreshFeed;
///
/// #[async_trait]
/// impl TaskPayload for RefreshFeed {
///     async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
///         ctx.bounded(fetch_feed()).await??;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskPayload: Send + Sync + 'static {
    /// Execute the payload once
    ///
    /// # Errors
    ///
    /// Return [`TaskError::remote`] for network failures and
    /// [`TaskError::malformed`] for unusable remote data. Implementations must
    /// not leave partially applied state behind when they fail.
    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError>;
}

/// Shared payloads, so the owner can keep using the payload after handing
/// it to a [`GatedTask`](crate::GatedTask)
#[async_trait]
impl<P: TaskPayload + ?Sized> TaskPayload for Arc<P> {
    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        (**self).execute(ctx).await
    }
}

/// Entry point a scheduler invokes
///
/// Implementations decide the outcome themselves; they never panic or return
/// errors to the scheduler.
#[async_trait]
pub trait BackgroundTask: Send + Sync + 'static {
    /// Name of this task
    fn kind(&self) -> TaskKind;

    /// Run one invocation
    async fn run(&self, ctx: &TaskContext) -> TaskOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_task_kind() {
        const KIND: TaskKind = TaskKind::new("poll_venues");
        assert_eq!(KIND.as_str(), "poll_venues");
        assert_eq!(KIND.to_string(), "poll_venues");
    }

    #[test]
    fn test_task_error_kinds() {
        assert_eq!(TaskError::remote("x").kind, TaskErrorKind::Remote);
        assert_eq!(
            TaskError::malformed("x").kind,
            TaskErrorKind::MalformedResponse
        );
        assert_eq!(TaskError::local("x").kind, TaskErrorKind::Local);
    }

    #[test]
    fn test_interruption_is_remote() {
        let error = TaskError::from(Interruption::TimedOut {
            limit: Duration::from_secs(5),
        });

        assert_eq!(error.kind, TaskErrorKind::Remote);
        assert!(error.to_string().contains("timed out"));
    }
}
