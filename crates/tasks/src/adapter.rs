//! Scheduler-facing task adapter
//!
//! [`GatedTask`] turns a payload into a [`BackgroundTask`]:
//!
//! 1. Ask the availability gate. Closed gate -> `Retry`, nothing else happens.
//! 2. Record one completion fact.
//! 3. Run the payload. `Ok` -> `Success`, `Err` -> `Failure`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument, warn};

use crate::gate::AvailabilityGate;
use crate::task::{BackgroundTask, TaskContext, TaskErrorKind, TaskKind, TaskOutcome, TaskPayload};
use crate::telemetry::CompletionReporter;

/// A payload wrapped with availability gating and completion reporting
///
/// All collaborators are supplied up front; there is no later wiring step.
pub struct GatedTask<P> {
    kind: TaskKind,
    gate: Arc<dyn AvailabilityGate>,
    payload: P,
    reporter: CompletionReporter,
}

impl<P: TaskPayload> GatedTask<P> {
    /// Create a gated task
    pub fn new(
        kind: TaskKind,
        gate: Arc<dyn AvailabilityGate>,
        payload: P,
        reporter: CompletionReporter,
    ) -> Self {
        Self {
            kind,
            gate,
            payload,
            reporter,
        }
    }

    /// Get the wrapped payload
    pub fn payload(&self) -> &P {
        &self.payload
    }
}

#[async_trait]
impl<P: TaskPayload> BackgroundTask for GatedTask<P> {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    #[instrument(
        skip(self, ctx),
        fields(task_kind = %self.kind, invocation_id = %ctx.invocation_id, attempt = ctx.attempt)
    )]
    async fn run(&self, ctx: &TaskContext) -> TaskOutcome {
        if !self.gate.is_available() {
            debug!("Host unavailable, deferring task");
            return TaskOutcome::Retry;
        }

        self.reporter.record(self.kind);

        match self.payload.execute(ctx).await {
            Ok(()) => {
                debug!(elapsed_ms = ctx.elapsed().as_millis(), "Task payload completed");
                TaskOutcome::Success
            }
            Err(e) => {
                match e.kind {
                    TaskErrorKind::MalformedResponse => {
                        error!(error = %e, "Task payload received a malformed response")
                    }
                    TaskErrorKind::Remote | TaskErrorKind::Local => {
                        warn!(error = %e, kind = ?e.kind, "Task payload failed")
                    }
                }
                TaskOutcome::failure(e.message)
            }
        }
    }
}
