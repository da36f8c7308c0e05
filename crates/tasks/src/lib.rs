//! # Background Task Core
//!
//! Building blocks for recurring background work that must tolerate a host
//! environment which is not always able to run it.
//!
//! ## Features
//!
//! - **Explicit outcomes**: every invocation ends in [`TaskOutcome::Retry`],
//!   [`TaskOutcome::Success`] or [`TaskOutcome::Failure`]
//! - **Availability gating**: an unavailable host defers the task instead of failing it
//! - **Completion telemetry**: one fire-and-forget record per invocation that reaches its payload
//! - **Bounded execution**: cancellation tokens and timeouts flow down to the payload
//! - **Periodic scheduling**: an in-process scheduler with backoff and per-task exclusivity
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PeriodicScheduler                         │
//! │  (periodicity, backoff, at-most-one run per task name)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ TaskContext
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       GatedTask                              │
//! │  AvailabilityGate ─► CompletionReporter ─► TaskPayload      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                 TaskOutcome { Retry | Success | Failure }
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use venuewatch_tasks::prelude::*;
//!
//! let task = GatedTask::new(
//!     TaskKind::new("sync_venues"),
//!     Arc::new(StaticAvailability::available()),
//!     MyPayload::new(),
//!     CompletionReporter::new().with_sink(Arc::new(TracingTelemetrySink)),
//! );
//!
//! let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
//! scheduler.register(Arc::new(task), TaskSchedule::every(Duration::from_secs(900)))?;
//! scheduler.start()?;
//! ```

pub mod adapter;
pub mod gate;
pub mod reliability;
pub mod scheduler;
pub mod task;
pub mod telemetry;

/// Prelude for common imports
pub mod prelude {
    pub use crate::adapter::GatedTask;
    pub use crate::gate::{AvailabilityGate, StaticAvailability, SwitchableAvailability};
    pub use crate::reliability::{RetryPolicy, TimeoutConfig};
    pub use crate::scheduler::{
        PeriodicScheduler, SchedulerConfig, SchedulerError, SchedulerStatus, TaskRunState,
        TaskSchedule, TriggerError,
    };
    pub use crate::task::{
        BackgroundTask, Interruption, TaskContext, TaskError, TaskErrorKind, TaskKind,
        TaskOutcome, TaskPayload,
    };
    pub use crate::telemetry::{
        ChannelTelemetrySink, CompletionRecord, CompletionReporter, InMemoryTelemetrySink,
        TelemetryError, TelemetrySink, TracingTelemetrySink,
    };
}

// Re-export key types at crate root
pub use adapter::GatedTask;
pub use gate::{AvailabilityGate, StaticAvailability, SwitchableAvailability};
pub use reliability::{RetryPolicy, TimeoutConfig};
pub use scheduler::{
    PeriodicScheduler, SchedulerConfig, SchedulerError, SchedulerStatus, TaskRunState,
    TaskSchedule, TriggerError,
};
pub use task::{
    BackgroundTask, Interruption, TaskContext, TaskError, TaskErrorKind, TaskKind, TaskOutcome,
    TaskPayload,
};
pub use telemetry::{
    ChannelTelemetrySink, CompletionRecord, CompletionReporter, InMemoryTelemetrySink,
    TelemetryError, TelemetrySink, TracingTelemetrySink,
};
