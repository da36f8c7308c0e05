//! Venuewatch background worker
//!
//! Hosts the periodic scheduler and the risky-venue circuit-breaker polling
//! task, configured from the environment.

pub mod config;
pub mod telemetry;
pub mod worker;

pub use config::{ConfigError, WorkerConfig};
pub use telemetry::{init_tracing, log_filter_from_env};
pub use worker::{Worker, WorkerError, WorkerStores};
