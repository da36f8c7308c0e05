//! Local persistence for outstanding requests and raised alerts
//!
//! Both stores are keyed by check-in identity. Writes for one check-in
//! replace whatever was stored before (last writer wins).

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::model::{CheckInId, PollingEntry, RiskyVenueAlert};

/// Local storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Internal(String),
}

/// Outstanding circuit-breaker requests
#[async_trait]
pub trait PollingStore: Send + Sync {
    /// All outstanding entries, ordered by check-in
    async fn entries(&self) -> Result<Vec<PollingEntry>, StoreError>;

    /// Insert or replace the entry for a check-in
    async fn insert(&self, entry: PollingEntry) -> Result<(), StoreError>;

    /// Remove the entry for a check-in, returning whether one existed
    async fn remove(&self, check_in_id: &CheckInId) -> Result<bool, StoreError>;
}

/// Raised risky-venue alerts
#[async_trait]
pub trait VenueAlertStore: Send + Sync {
    async fn get(&self, check_in_id: &CheckInId) -> Result<Option<RiskyVenueAlert>, StoreError>;

    /// All alerts, ordered by check-in
    async fn alerts(&self) -> Result<Vec<RiskyVenueAlert>, StoreError>;

    /// Store an alert for its check-in
    ///
    /// Returns `false` without writing when the same alert is already stored.
    async fn upsert(&self, alert: RiskyVenueAlert) -> Result<bool, StoreError>;
}

/// In-memory polling store
#[derive(Debug, Default)]
pub struct InMemoryPollingStore {
    entries: RwLock<BTreeMap<CheckInId, PollingEntry>>,
}

impl InMemoryPollingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl PollingStore for InMemoryPollingStore {
    async fn entries(&self) -> Result<Vec<PollingEntry>, StoreError> {
        Ok(self.entries.read().values().cloned().collect())
    }

    async fn insert(&self, entry: PollingEntry) -> Result<(), StoreError> {
        self.entries
            .write()
            .insert(entry.check_in_id.clone(), entry);
        Ok(())
    }

    async fn remove(&self, check_in_id: &CheckInId) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(check_in_id).is_some())
    }
}

/// In-memory alert store
#[derive(Debug, Default)]
pub struct InMemoryVenueAlertStore {
    alerts: RwLock<BTreeMap<CheckInId, RiskyVenueAlert>>,
}

impl InMemoryVenueAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }
}

#[async_trait]
impl VenueAlertStore for InMemoryVenueAlertStore {
    async fn get(&self, check_in_id: &CheckInId) -> Result<Option<RiskyVenueAlert>, StoreError> {
        Ok(self.alerts.read().get(check_in_id).cloned())
    }

    async fn alerts(&self) -> Result<Vec<RiskyVenueAlert>, StoreError> {
        Ok(self.alerts.read().values().cloned().collect())
    }

    async fn upsert(&self, alert: RiskyVenueAlert) -> Result<bool, StoreError> {
        let mut alerts = self.alerts.write();
        if let Some(existing) = alerts.get(&alert.check_in_id) {
            if existing.same_alert(&alert) {
                return Ok(false);
            }
        }
        alerts.insert(alert.check_in_id.clone(), alert);
        Ok(true)
    }
}
