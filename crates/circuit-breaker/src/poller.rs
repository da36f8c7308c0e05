//! Circuit-breaker poller
//!
//! One poll walks every outstanding [`PollingEntry`], asks the decision
//! source for its current resolution and applies the answers locally.
//!
//! ```text
//!   entries ──► expired? ──yes──────────────────────────────┐
//!                 │ no                                      │
//!                 ▼                                         │
//!       fetch all resolutions (bounded by TaskContext)      │
//!                 │  any error -> PollError, nothing applied│
//!                 ▼                                         ▼
//!       apply: Pending -> keep | Approved -> alert + remove | Rejected -> remove
//!              unknown token -> remove
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use venuewatch_tasks::TaskContext;

use crate::decision::CircuitBreakerDecision;
use crate::error::PollError;
use crate::model::{CheckInId, PollingEntry, RiskyCheckIn, RiskyVenueAlert, VenueId};
use crate::notifier::VenueAlertNotifier;
use crate::source::{DecisionSource, DecisionSourceError};
use crate::store::{PollingStore, VenueAlertStore};

/// Poller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Outstanding requests older than this are dropped without asking again
    #[serde(with = "venuewatch_tasks::reliability::duration_millis")]
    pub max_polling_age: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_polling_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum polling age
    pub fn with_max_polling_age(mut self, age: Duration) -> Self {
        self.max_polling_age = age;
        self
    }
}

/// What one poll did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    /// Entries whose resolution was fetched
    pub polled: usize,
    pub still_pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Entries dropped for exceeding the maximum polling age
    pub expired: usize,
    /// Entries dropped because the remote no longer knows their token
    pub unknown: usize,
    /// Alerts written that did not exist before
    pub alerts_raised: usize,
}

impl PollSummary {
    /// Whether the poll changed any local state
    pub fn changed_state(&self) -> bool {
        self.approved + self.rejected + self.expired + self.unknown > 0
    }
}

/// Polls the circuit breaker for outstanding risky-venue check-ins
pub struct CircuitBreakerPoller {
    source: Arc<dyn DecisionSource>,
    polling: Arc<dyn PollingStore>,
    alerts: Arc<dyn VenueAlertStore>,
    notifier: Arc<dyn VenueAlertNotifier>,
    config: PollerConfig,
}

impl CircuitBreakerPoller {
    pub fn new(
        source: Arc<dyn DecisionSource>,
        polling: Arc<dyn PollingStore>,
        alerts: Arc<dyn VenueAlertStore>,
        notifier: Arc<dyn VenueAlertNotifier>,
    ) -> Self {
        Self {
            source,
            polling,
            alerts,
            notifier,
            config: PollerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Send the initial circuit-breaker request for a risky check-in
    ///
    /// A final answer is applied immediately; a pending one is stored for
    /// later polls.
    #[instrument(
        skip(self, ctx, check_in),
        fields(check_in_id = %check_in.check_in_id, venue_id = %check_in.venue_id)
    )]
    pub async fn submit(
        &self,
        ctx: &TaskContext,
        check_in: RiskyCheckIn,
    ) -> Result<CircuitBreakerDecision, PollError> {
        let response = ctx
            .bounded(self.source.request_approval(&check_in.venue_id))
            .await??;
        let now = Utc::now();

        match response.approval {
            CircuitBreakerDecision::Pending => {
                debug!(approval_token = %response.approval_token, "Decision pending, polling later");
                self.polling
                    .insert(PollingEntry {
                        check_in_id: check_in.check_in_id,
                        venue_id: check_in.venue_id,
                        approval_token: response.approval_token,
                        started_at: now,
                    })
                    .await?;
            }
            CircuitBreakerDecision::Approved => {
                self.raise_alert(&check_in.check_in_id, &check_in.venue_id, now)
                    .await?;
            }
            CircuitBreakerDecision::Rejected => {
                info!("Circuit breaker rejected alert");
            }
        }

        Ok(response.approval)
    }

    /// Run one polling cycle over all outstanding entries
    ///
    /// Every resolution is fetched before anything is written, so a remote
    /// failure or malformed answer leaves local state untouched.
    #[instrument(skip(self, ctx), fields(invocation_id = %ctx.invocation_id))]
    pub async fn poll(&self, ctx: &TaskContext) -> Result<PollSummary, PollError> {
        let now = Utc::now();
        let (expired, live): (Vec<_>, Vec<_>) = self
            .polling
            .entries()
            .await?
            .into_iter()
            .partition(|entry| self.is_expired(entry, now));

        let mut resolved = Vec::with_capacity(live.len());
        for entry in live {
            let decision = match ctx
                .bounded(self.source.resolution(&entry.approval_token))
                .await?
            {
                Ok(decision) => Some(decision),
                Err(DecisionSourceError::UnknownToken(_)) => None,
                Err(e) => return Err(e.into()),
            };
            resolved.push((entry, decision));
        }

        let mut summary = PollSummary {
            polled: resolved.len(),
            ..PollSummary::default()
        };

        for entry in expired {
            info!(check_in_id = %entry.check_in_id, started_at = %entry.started_at, "Dropping expired circuit-breaker request");
            self.polling.remove(&entry.check_in_id).await?;
            summary.expired += 1;
        }

        for (entry, decision) in resolved {
            match decision {
                None => {
                    warn!(
                        check_in_id = %entry.check_in_id,
                        approval_token = %entry.approval_token,
                        "Approval token unknown to circuit breaker, dropping request"
                    );
                    self.polling.remove(&entry.check_in_id).await?;
                    summary.unknown += 1;
                }
                Some(CircuitBreakerDecision::Pending) => {
                    summary.still_pending += 1;
                }
                Some(CircuitBreakerDecision::Approved) => {
                    if self
                        .raise_alert(&entry.check_in_id, &entry.venue_id, now)
                        .await?
                    {
                        summary.alerts_raised += 1;
                    }
                    self.polling.remove(&entry.check_in_id).await?;
                    summary.approved += 1;
                }
                Some(CircuitBreakerDecision::Rejected) => {
                    debug!(check_in_id = %entry.check_in_id, "Circuit breaker rejected alert");
                    self.polling.remove(&entry.check_in_id).await?;
                    summary.rejected += 1;
                }
            }
        }

        debug!(?summary, "Circuit-breaker poll complete");
        Ok(summary)
    }

    fn is_expired(&self, entry: &PollingEntry, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.started_at)
            .to_std()
            .map(|age| age > self.config.max_polling_age)
            .unwrap_or(false)
    }

    /// Store the alert and notify if it is new
    async fn raise_alert(
        &self,
        check_in_id: &CheckInId,
        venue_id: &VenueId,
        now: DateTime<Utc>,
    ) -> Result<bool, PollError> {
        let alert = RiskyVenueAlert {
            check_in_id: check_in_id.clone(),
            venue_id: venue_id.clone(),
            approved_at: now,
        };

        let created = self.alerts.upsert(alert.clone()).await?;
        if created {
            self.notifier.notify(&alert);
        }
        Ok(created)
    }
}

impl std::fmt::Debug for CircuitBreakerPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerPoller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
