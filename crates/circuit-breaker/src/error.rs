//! Poller error types

use thiserror::Error;
use venuewatch_tasks::{Interruption, TaskError};

use crate::source::DecisionSourceError;
use crate::store::StoreError;

/// Why a polling cycle (or initial request) did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("remote decision source failed: {0}")]
    Remote(String),

    #[error("malformed decision response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Interrupted(#[from] Interruption),

    #[error("local store failed: {0}")]
    Store(#[from] StoreError),
}

impl PollError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedResponse(_))
    }
}

impl From<DecisionSourceError> for PollError {
    fn from(err: DecisionSourceError) -> Self {
        match err {
            DecisionSourceError::Malformed(msg) => PollError::MalformedResponse(msg),
            other => PollError::Remote(other.to_string()),
        }
    }
}

impl From<PollError> for TaskError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::MalformedResponse(_) => TaskError::malformed(err.to_string()),
            PollError::Store(_) => TaskError::local(err.to_string()),
            PollError::Remote(_) | PollError::Interrupted(_) => TaskError::remote(err.to_string()),
        }
    }
}
