//! Circuit-breaker decision vocabulary
//!
//! The decision endpoint answers with `approval: "yes" | "no" | "pending"`.
//! Anything else fails deserialization and is treated as a malformed response.

use serde::{Deserialize, Serialize};

use crate::model::ApprovalToken;

/// Remote verdict on whether a risky-venue alert may be raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitBreakerDecision {
    /// Not decided yet; ask again later
    #[serde(rename = "pending")]
    Pending,
    /// Alert the user
    #[serde(rename = "yes")]
    Approved,
    /// Do not alert the user
    #[serde(rename = "no")]
    Rejected,
}

impl CircuitBreakerDecision {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for CircuitBreakerDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Body sent with the initial circuit-breaker request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialRequest {
    pub venue_id: String,
}

/// Answer to the initial circuit-breaker request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialResponse {
    pub approval_token: ApprovalToken,
    pub approval: CircuitBreakerDecision,
}

/// Answer to a resolution lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResponse {
    pub approval: CircuitBreakerDecision,
}
