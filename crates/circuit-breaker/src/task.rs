//! The risky-venue circuit-breaker polling task

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use venuewatch_tasks::{
    AvailabilityGate, CompletionReporter, GatedTask, TaskContext, TaskError, TaskKind,
    TaskPayload,
};

use crate::poller::CircuitBreakerPoller;

/// Task name used for scheduling and completion telemetry
pub const RISKY_VENUES_CIRCUIT_BREAKER_POLLING: TaskKind =
    TaskKind::new("risky_venues_circuit_breaker_polling");

#[async_trait]
impl TaskPayload for CircuitBreakerPoller {
    async fn execute(&self, ctx: &TaskContext) -> Result<(), TaskError> {
        let summary = self.poll(ctx).await?;
        if summary.changed_state() {
            info!(
                approved = summary.approved,
                rejected = summary.rejected,
                expired = summary.expired,
                unknown = summary.unknown,
                alerts_raised = summary.alerts_raised,
                "Applied circuit-breaker decisions"
            );
        }
        Ok(())
    }
}

/// Build the gated polling task
///
/// The poller is shared so its owner can keep submitting new check-ins.
pub fn polling_task(
    gate: Arc<dyn AvailabilityGate>,
    poller: Arc<CircuitBreakerPoller>,
    reporter: CompletionReporter,
) -> GatedTask<Arc<CircuitBreakerPoller>> {
    GatedTask::new(RISKY_VENUES_CIRCUIT_BREAKER_POLLING, gate, poller, reporter)
}
