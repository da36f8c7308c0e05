//! JSON-over-HTTP decision source

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::decision::{CircuitBreakerDecision, InitialRequest, InitialResponse, ResolutionResponse};
use crate::model::{ApprovalToken, VenueId};
use crate::source::{DecisionSource, DecisionSourceError};

const REQUEST_PATH: &str = "/circuit-breaker/venue/request";
const RESOLUTION_PATH: &str = "/circuit-breaker/venue/resolution";

/// Decision source backed by the circuit-breaker HTTP API
pub struct HttpDecisionSource {
    base_url: String,
    http: reqwest::Client,
}

impl HttpDecisionSource {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a preconfigured client (timeouts, TLS, default headers)
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DecisionSourceError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DecisionSourceError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DecisionSourceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl DecisionSource for HttpDecisionSource {
    async fn request_approval(
        &self,
        venue_id: &VenueId,
    ) -> Result<InitialResponse, DecisionSourceError> {
        let url = format!("{}{}", self.base_url, REQUEST_PATH);
        let body = InitialRequest {
            venue_id: venue_id.to_string(),
        };

        debug!(%url, venue_id = %venue_id, "Requesting circuit-breaker approval");
        let response = self.http.post(&url).json(&body).send().await?;
        let initial: InitialResponse = self.handle_response(response).await?;

        if initial.approval_token.is_empty() {
            return Err(DecisionSourceError::Malformed(
                "empty approval token".to_string(),
            ));
        }

        Ok(initial)
    }

    async fn resolution(
        &self,
        token: &ApprovalToken,
    ) -> Result<CircuitBreakerDecision, DecisionSourceError> {
        let url = format!("{}{}/{}", self.base_url, RESOLUTION_PATH, token);

        debug!(%url, "Fetching circuit-breaker resolution");
        let response = self.http.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(DecisionSourceError::UnknownToken(token.to_string()));
        }

        let resolution: ResolutionResponse = self.handle_response(response).await?;
        Ok(resolution.approval)
    }
}

impl From<reqwest::Error> for DecisionSourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DecisionSourceError::Malformed(err.to_string())
        } else {
            DecisionSourceError::Transport(err.to_string())
        }
    }
}
