//! Task abstractions
//!
//! A background task is invoked by a scheduler and reports one of three
//! outcomes. Tasks:
//! - Receive a [`TaskContext`] carrying the invocation budget and cancellation
//! - Delegate their real work to a [`TaskPayload`]
//! - Never report success without attempting the payload

mod context;
mod definition;
mod outcome;

pub use context::{Interruption, TaskContext};
pub use definition::{BackgroundTask, TaskError, TaskErrorKind, TaskKind, TaskPayload};
pub use outcome::TaskOutcome;
