//! # Risky Venue Circuit Breaker
//!
//! Before a risky-venue alert is shown, a remote circuit breaker has to
//! approve it. The initial request may come back `pending`, in which case the
//! check-in is remembered and polled in the background until the circuit
//! breaker answers `yes` or `no` (or the request gets too old).
//!
//! ## Components
//!
//! - [`DecisionSource`] / [`HttpDecisionSource`]: the remote decision endpoint
//! - [`PollingStore`] / [`VenueAlertStore`]: local state keyed by check-in
//! - [`CircuitBreakerPoller`]: initial requests and polling cycles
//! - [`polling_task`]: the poller wrapped as a gated background task
//!
//! ## Example
//!
//! ```ignore
//! use venuewatch_circuit_breaker::*;
//!
//! let poller = CircuitBreakerPoller::new(
//!     Arc::new(HttpDecisionSource::new("https://api.example.com")),
//!     Arc::new(InMemoryPollingStore::new()),
//!     Arc::new(InMemoryVenueAlertStore::new()),
//!     Arc::new(LoggingNotifier),
//! );
//!
//! let task = polling_task(gate, poller, reporter);
//! scheduler.register(Arc::new(task), TaskSchedule::every(Duration::from_secs(900)))?;
//! ```

pub mod decision;
pub mod error;
pub mod http;
pub mod model;
pub mod notifier;
pub mod poller;
pub mod source;
pub mod store;
pub mod task;

pub use decision::{CircuitBreakerDecision, InitialRequest, InitialResponse, ResolutionResponse};
pub use error::PollError;
pub use http::HttpDecisionSource;
pub use model::{ApprovalToken, CheckInId, PollingEntry, RiskyCheckIn, RiskyVenueAlert, VenueId};
pub use notifier::{LoggingNotifier, VenueAlertNotifier};
pub use poller::{CircuitBreakerPoller, PollSummary, PollerConfig};
pub use source::{DecisionSource, DecisionSourceError};
pub use store::{
    InMemoryPollingStore, InMemoryVenueAlertStore, PollingStore, StoreError, VenueAlertStore,
};
pub use task::{polling_task, RISKY_VENUES_CIRCUIT_BREAKER_POLLING};
