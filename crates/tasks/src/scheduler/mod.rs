//! Periodic scheduling for background tasks
//!
//! This module provides:
//! - [`PeriodicScheduler`] - Runs registered tasks on their own cadence
//! - [`TaskSchedule`] - Interval, failure backoff and deferral delay per task
//! - [`TaskRunState`] - Outcome bookkeeping between invocations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PeriodicScheduler                         │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Task loop A │  │ Task loop B │  │  trigger(kind)      │  │
//! │  │  (sleep)    │  │  (sleep)    │  │  (on demand)        │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬──────────┘  │
//! │         └────────────────┼────────────────────┘             │
//! │                          ▼                                   │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │   RunGuard (at most one invocation per task kind)   │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! │                          │                                   │
//! │                          ▼                                   │
//! │   Success -> interval | Retry -> deferral | Failure -> backoff│
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod periodic;
mod state;

pub use config::{SchedulerConfig, TaskSchedule};
pub use periodic::{PeriodicScheduler, SchedulerError, SchedulerStatus, TriggerError};
pub use state::TaskRunState;
