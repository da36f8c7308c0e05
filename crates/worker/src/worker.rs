//! Wiring of the scheduler, gate and circuit-breaker poller

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use venuewatch_circuit_breaker::{
    polling_task, CircuitBreakerDecision, CircuitBreakerPoller, DecisionSource,
    HttpDecisionSource, InMemoryPollingStore, InMemoryVenueAlertStore, LoggingNotifier,
    PollError, PollingStore, RiskyCheckIn, VenueAlertStore, RISKY_VENUES_CIRCUIT_BREAKER_POLLING,
};
use venuewatch_tasks::{
    CompletionReporter, PeriodicScheduler, SchedulerConfig, SchedulerError,
    SwitchableAvailability, TaskContext, TaskOutcome, TracingTelemetrySink, TriggerError,
};

use crate::config::WorkerConfig;

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Local stores the poller works against
#[derive(Clone)]
pub struct WorkerStores {
    pub polling: Arc<dyn PollingStore>,
    pub alerts: Arc<dyn VenueAlertStore>,
}

impl Default for WorkerStores {
    fn default() -> Self {
        Self {
            polling: Arc::new(InMemoryPollingStore::new()),
            alerts: Arc::new(InMemoryVenueAlertStore::new()),
        }
    }
}

/// Hosts the periodic scheduler with the circuit-breaker polling task
pub struct Worker {
    config: WorkerConfig,
    scheduler: PeriodicScheduler,
    availability: Arc<SwitchableAvailability>,
    poller: Arc<CircuitBreakerPoller>,
}

impl Worker {
    /// Create a worker talking to the configured decision API
    pub fn new(config: WorkerConfig) -> Result<Self, WorkerError> {
        let http = reqwest::Client::builder()
            .timeout(config.poll_timeout)
            .build()?;
        let source = Arc::new(HttpDecisionSource::with_client(
            &config.decision_api_url,
            http,
        ));
        Self::with_source(config, source, WorkerStores::default())
    }

    /// Create a worker with an explicit decision source and stores
    pub fn with_source(
        config: WorkerConfig,
        source: Arc<dyn DecisionSource>,
        stores: WorkerStores,
    ) -> Result<Self, WorkerError> {
        let availability = Arc::new(SwitchableAvailability::new(config.host_available));
        let poller = Arc::new(
            CircuitBreakerPoller::new(
                source,
                stores.polling,
                stores.alerts,
                Arc::new(LoggingNotifier),
            )
            .with_config(config.poller_config()),
        );
        let reporter = CompletionReporter::new().with_sink(Arc::new(TracingTelemetrySink));

        let scheduler = PeriodicScheduler::new(
            SchedulerConfig::new().with_scheduler_id(format!("{}-scheduler", config.worker_id)),
        );
        scheduler.register(
            Arc::new(polling_task(availability.clone(), poller.clone(), reporter)),
            config.task_schedule(),
        )?;

        Ok(Self {
            config,
            scheduler,
            availability,
            poller,
        })
    }

    /// Start the polling loop
    pub fn start(&self) -> Result<(), WorkerError> {
        info!(
            worker_id = %self.config.worker_id,
            decision_api_url = %self.config.decision_api_url,
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Starting circuit-breaker polling"
        );
        self.scheduler.start()?;
        Ok(())
    }

    /// Poll once right now, outside the regular cadence
    pub async fn poll_now(&self) -> Result<TaskOutcome, WorkerError> {
        Ok(self
            .scheduler
            .trigger(RISKY_VENUES_CIRCUIT_BREAKER_POLLING)
            .await?)
    }

    /// Send the initial circuit-breaker request for a newly flagged check-in
    ///
    /// Runs under the same time limits as a polling invocation. A pending
    /// answer is picked up by later polls.
    pub async fn submit(
        &self,
        check_in: RiskyCheckIn,
    ) -> Result<CircuitBreakerDecision, WorkerError> {
        let ctx = TaskContext::new(RISKY_VENUES_CIRCUIT_BREAKER_POLLING)
            .with_timeouts(self.config.task_schedule().timeouts);
        Ok(self.poller.submit(&ctx, check_in).await?)
    }

    /// Flip host availability (e.g. on lock/unlock)
    pub fn set_available(&self, available: bool) {
        info!(available, "Host availability changed");
        self.availability.set_available(available);
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PeriodicScheduler {
        &self.scheduler
    }

    /// Stop the scheduler, cancelling any in-flight poll
    pub async fn shutdown(&self) -> Result<(), WorkerError> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use venuewatch_circuit_breaker::{
        ApprovalToken, CheckInId, CircuitBreakerDecision, DecisionSourceError, InitialResponse,
        PollingEntry, VenueId,
    };

    use super::*;

    /// Answers every initial request with pending and every lookup with approved
    struct ApprovingSource;

    #[async_trait]
    impl DecisionSource for ApprovingSource {
        async fn request_approval(
            &self,
            _venue_id: &VenueId,
        ) -> Result<InitialResponse, DecisionSourceError> {
            Ok(InitialResponse {
                approval_token: ApprovalToken::new("tok-submitted"),
                approval: CircuitBreakerDecision::Pending,
            })
        }

        async fn resolution(
            &self,
            _token: &ApprovalToken,
        ) -> Result<CircuitBreakerDecision, DecisionSourceError> {
            Ok(CircuitBreakerDecision::Approved)
        }
    }

    async fn worker_with_entry(host_available: bool) -> (Worker, WorkerStores) {
        let stores = WorkerStores::default();
        stores
            .polling
            .insert(PollingEntry {
                check_in_id: CheckInId::new("c1"),
                venue_id: VenueId::new("venue-x"),
                approval_token: ApprovalToken::new("tok"),
                started_at: Utc::now(),
            })
            .await
            .unwrap();

        let config = WorkerConfig {
            host_available,
            ..WorkerConfig::default()
        };
        let worker = Worker::with_source(config, Arc::new(ApprovingSource), stores.clone()).unwrap();
        (worker, stores)
    }

    #[tokio::test]
    async fn test_submitted_check_in_is_approved_by_next_poll() {
        let stores = WorkerStores::default();
        let worker = Worker::with_source(
            WorkerConfig::default(),
            Arc::new(ApprovingSource),
            stores.clone(),
        )
        .unwrap();

        let decision = worker
            .submit(RiskyCheckIn::new("c7", "venue-z"))
            .await
            .unwrap();

        assert_eq!(decision, CircuitBreakerDecision::Pending);
        let entries = stores.polling.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].approval_token.as_str(), "tok-submitted");
        assert!(stores.alerts.alerts().await.unwrap().is_empty());

        assert_eq!(worker.poll_now().await.unwrap(), TaskOutcome::Success);

        assert!(stores.polling.entries().await.unwrap().is_empty());
        let alerts = stores.alerts.alerts().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].check_in_id.as_str(), "c7");
        assert_eq!(alerts[0].venue_id.as_str(), "venue-z");
    }

    #[tokio::test]
    async fn test_poll_now_applies_decisions() {
        let (worker, stores) = worker_with_entry(true).await;

        assert_eq!(worker.poll_now().await.unwrap(), TaskOutcome::Success);
        assert!(stores.polling.entries().await.unwrap().is_empty());
        assert_eq!(stores.alerts.alerts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_host_defers_until_switched() {
        let (worker, stores) = worker_with_entry(false).await;

        assert_eq!(worker.poll_now().await.unwrap(), TaskOutcome::Retry);
        assert_eq!(stores.polling.entries().await.unwrap().len(), 1);

        worker.set_available(true);
        assert_eq!(worker.poll_now().await.unwrap(), TaskOutcome::Success);
        assert!(stores.polling.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let (worker, _) = worker_with_entry(true).await;
        worker.start().unwrap();
        worker.shutdown().await.unwrap();
        assert_eq!(
            worker.scheduler().registered_tasks(),
            vec![RISKY_VENUES_CIRCUIT_BREAKER_POLLING]
        );
    }
}
