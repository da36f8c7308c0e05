//! Remote decision source abstraction

use async_trait::async_trait;
use thiserror::Error;

use crate::decision::{CircuitBreakerDecision, InitialResponse};
use crate::model::{ApprovalToken, VenueId};

/// Errors from talking to the decision endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionSourceError {
    /// Connection, DNS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("decision endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The endpoint answered with something we cannot interpret
    #[error("malformed decision response: {0}")]
    Malformed(String),

    /// The endpoint no longer knows the approval token
    #[error("unknown approval token: {0}")]
    UnknownToken(String),
}

impl DecisionSourceError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Remote authority deciding whether risky-venue alerts may be raised
#[async_trait]
pub trait DecisionSource: Send + Sync {
    /// Ask for a decision about a venue for the first time
    async fn request_approval(
        &self,
        venue_id: &VenueId,
    ) -> Result<InitialResponse, DecisionSourceError>;

    /// Look up the current decision for an earlier request
    ///
    /// Returns [`DecisionSourceError::UnknownToken`] when the request has been
    /// forgotten remotely and will never be decided.
    async fn resolution(
        &self,
        token: &ApprovalToken,
    ) -> Result<CircuitBreakerDecision, DecisionSourceError>;
}
