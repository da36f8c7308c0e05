// Completion telemetry
//
// Every invocation that passes the availability gate emits exactly one
// CompletionRecord. Reporting is fire-and-forget: sink failures are logged and
// dropped so they can never change a task's outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::task::TaskKind;

/// Fact that a background cycle reached its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRecord {
    /// Task that ran
    pub task_kind: TaskKind,
    /// When the record was created
    pub recorded_at: DateTime<Utc>,
}

impl CompletionRecord {
    /// Create a record stamped with the current time
    pub fn now(task_kind: TaskKind) -> Self {
        Self {
            task_kind,
            recorded_at: Utc::now(),
        }
    }
}

/// Error from a telemetry sink
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    /// The sink's buffer is full
    #[error("telemetry buffer is full")]
    BufferFull,

    /// The receiving side went away
    #[error("telemetry channel closed")]
    ChannelClosed,

    /// The sink refused the record
    #[error("telemetry rejected: {0}")]
    Rejected(String),
}

/// Destination for completion records
///
/// `track` must not block; sinks that talk to slow transports should buffer.
pub trait TelemetrySink: Send + Sync {
    /// Sink name, used in logs
    fn name(&self) -> &'static str;

    /// Hand a record to the sink
    fn track(&self, record: &CompletionRecord) -> Result<(), TelemetryError>;
}

/// Fans one completion record out to all configured sinks
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use venuewatch_tasks::{CompletionReporter, InMemoryTelemetrySink, TaskKind};
///
/// let sink = Arc::new(InMemoryTelemetrySink::new());
/// let reporter = CompletionReporter::new().with_sink(sink.clone());
///
/// reporter.record(TaskKind::new("poll"));
/// assert_eq!(sink.count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct CompletionReporter {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompletionReporter {
    /// Create a reporter without sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of configured sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Record that a task reached its payload
    ///
    /// Never fails; sink errors are logged and swallowed.
    pub fn record(&self, task_kind: TaskKind) {
        let record = CompletionRecord::now(task_kind);

        for sink in &self.sinks {
            if let Err(e) = sink.track(&record) {
                warn!(
                    sink = sink.name(),
                    task_kind = %task_kind,
                    error = %e,
                    "Failed to record task completion"
                );
            }
        }
    }
}

impl std::fmt::Debug for CompletionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionReporter")
            .field(
                "sinks",
                &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Sink that writes records to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn track(&self, record: &CompletionRecord) -> Result<(), TelemetryError> {
        info!(
            task_kind = %record.task_kind,
            recorded_at = %record.recorded_at,
            "Background task completed a cycle"
        );
        Ok(())
    }
}

/// Sink that keeps records in memory
#[derive(Debug, Default)]
pub struct InMemoryTelemetrySink {
    records: Mutex<Vec<CompletionRecord>>,
}

impl InMemoryTelemetrySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records
    pub fn records(&self) -> Vec<CompletionRecord> {
        self.records.lock().clone()
    }

    /// Number of records
    pub fn count(&self) -> usize {
        self.records.lock().len()
    }

    /// Number of records for one task kind
    pub fn count_for(&self, task_kind: TaskKind) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.task_kind == task_kind)
            .count()
    }
}

impl TelemetrySink for InMemoryTelemetrySink {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    fn track(&self, record: &CompletionRecord) -> Result<(), TelemetryError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Sink that forwards records to a bounded channel without waiting
///
/// The receiver is typically drained by an analytics uploader task.
#[derive(Debug, Clone)]
pub struct ChannelTelemetrySink {
    tx: mpsc::Sender<CompletionRecord>,
}

impl ChannelTelemetrySink {
    /// Create a sink and the receiver for its records
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CompletionRecord>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl TelemetrySink for ChannelTelemetrySink {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn track(&self, record: &CompletionRecord) -> Result<(), TelemetryError> {
        self.tx.try_send(record.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TelemetryError::BufferFull,
            mpsc::error::TrySendError::Closed(_) => TelemetryError::ChannelClosed,
        })
    }
}
