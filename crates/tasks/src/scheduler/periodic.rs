//! Periodic scheduler
//!
//! Runs registered background tasks on their own cadence, applies backoff
//! after failures and deferrals, and never lets two invocations of the same
//! task overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::config::{SchedulerConfig, TaskSchedule};
use super::state::TaskRunState;
use crate::task::{BackgroundTask, TaskContext, TaskKind, TaskOutcome};

/// Scheduler status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Not started, or fully stopped
    Stopped,
    /// Loops are running
    Running,
    /// Shutdown requested, waiting for in-flight invocations
    Draining,
}

/// Scheduler lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A task with this kind is already registered
    #[error("task already registered: {0}")]
    DuplicateTask(TaskKind),

    /// Registration after start is not supported
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// Shutdown timeout
    #[error("graceful shutdown timed out")]
    ShutdownTimeout,

    /// A scheduler that has been shut down cannot be started again
    #[error("scheduler has been shut down")]
    ShutDown,
}

/// Errors from an on-demand trigger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    /// No task registered under this kind
    #[error("no task registered for kind: {0}")]
    UnknownTask(TaskKind),

    /// An invocation of this task is in flight
    #[error("task {0} is already running")]
    AlreadyRunning(TaskKind),

    /// The scheduler is shutting down
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

/// Clears the running flag when an invocation ends, however it ends
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// A registered task with its schedule and bookkeeping
struct ScheduledTask {
    task: Arc<dyn BackgroundTask>,
    schedule: TaskSchedule,
    running: AtomicBool,
    state: Mutex<TaskRunState>,
}

impl ScheduledTask {
    fn kind(&self) -> TaskKind {
        self.task.kind()
    }

    /// Claim the exclusive right to run
    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: &self.running,
            })
    }

    /// Run one invocation under the task's budget and record the outcome
    async fn invoke(&self, shutdown: &CancellationToken) -> TaskOutcome {
        let attempt = self.state.lock().consecutive_failures.saturating_add(1);
        let cancel = shutdown.child_token();
        let ctx = TaskContext::new(self.kind())
            .with_attempt(attempt)
            .with_timeouts(self.schedule.timeouts)
            .with_cancellation(cancel.clone());

        let limit = self.schedule.timeouts.invocation;
        let outcome = match tokio::time::timeout(limit, self.task.run(&ctx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                warn!(task_kind = %self.kind(), ?limit, "Invocation exceeded its budget");
                TaskOutcome::failure(format!("invocation exceeded {limit:?}"))
            }
        };

        self.state.lock().record(&outcome, ctx.started_at);
        outcome
    }
}

/// In-process periodic scheduler
///
/// # Example
///
/// ```ignore
/// use venuewatch_tasks::{PeriodicScheduler, SchedulerConfig, TaskSchedule};
///
/// let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
/// scheduler.register(task, TaskSchedule::every(Duration::from_secs(900)))?;
///
/// scheduler.start()?;
///
/// // ... later, graceful shutdown
/// scheduler.shutdown().await?;
/// ```
pub struct PeriodicScheduler {
    config: SchedulerConfig,
    tasks: RwLock<HashMap<TaskKind, Arc<ScheduledTask>>>,
    shutdown: CancellationToken,
    status: RwLock<SchedulerStatus>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PeriodicScheduler {
    /// Create a new scheduler
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tasks: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            status: RwLock::new(SchedulerStatus::Stopped),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Register a task
    pub fn register(
        &self,
        task: Arc<dyn BackgroundTask>,
        schedule: TaskSchedule,
    ) -> Result<(), SchedulerError> {
        if *self.status.read() != SchedulerStatus::Stopped {
            return Err(SchedulerError::AlreadyRunning);
        }

        let kind = task.kind();
        let mut tasks = self.tasks.write();
        if tasks.contains_key(&kind) {
            return Err(SchedulerError::DuplicateTask(kind));
        }

        tasks.insert(
            kind,
            Arc::new(ScheduledTask {
                task,
                schedule,
                running: AtomicBool::new(false),
                state: Mutex::new(TaskRunState::default()),
            }),
        );
        debug!(task_kind = %kind, "Registered task");
        Ok(())
    }

    /// Start one loop per registered task
    #[instrument(skip(self), fields(scheduler_id = %self.config.scheduler_id))]
    pub fn start(&self) -> Result<(), SchedulerError> {
        {
            let mut status = self.status.write();
            if self.shutdown.is_cancelled() {
                return Err(SchedulerError::ShutDown);
            }
            if *status != SchedulerStatus::Stopped {
                return Err(SchedulerError::AlreadyRunning);
            }
            *status = SchedulerStatus::Running;
        }

        let tasks: Vec<Arc<ScheduledTask>> = self.tasks.read().values().cloned().collect();
        info!(
            scheduler_id = %self.config.scheduler_id,
            tasks = tasks.len(),
            "Starting scheduler"
        );

        let mut handles = self.handles.lock();
        for entry in tasks {
            handles.push(self.spawn_loop(entry));
        }

        Ok(())
    }

    /// Run a task now, outside its regular cadence
    ///
    /// The task's loop keeps its own timer; exclusivity still applies.
    pub async fn trigger(&self, kind: TaskKind) -> Result<TaskOutcome, TriggerError> {
        if self.shutdown.is_cancelled() {
            return Err(TriggerError::ShuttingDown);
        }

        let entry = self
            .tasks
            .read()
            .get(&kind)
            .cloned()
            .ok_or(TriggerError::UnknownTask(kind))?;

        let _guard = entry.try_begin().ok_or(TriggerError::AlreadyRunning(kind))?;
        Ok(entry.invoke(&self.shutdown).await)
    }

    /// Shutdown the scheduler gracefully
    ///
    /// In-flight invocations see their cancellation token fire.
    #[instrument(skip(self), fields(scheduler_id = %self.config.scheduler_id))]
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        {
            let mut status = self.status.write();
            if *status == SchedulerStatus::Stopped {
                return Ok(());
            }
            *status = SchedulerStatus::Draining;
        }

        info!(scheduler_id = %self.config.scheduler_id, "Initiating graceful shutdown");
        self.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.handles.lock());
        let joined = tokio::time::timeout(
            self.config.shutdown_timeout,
            futures::future::join_all(handles),
        )
        .await;

        if joined.is_err() {
            warn!("Shutdown timeout reached");
            return Err(SchedulerError::ShutdownTimeout);
        }

        *self.status.write() = SchedulerStatus::Stopped;
        info!(scheduler_id = %self.config.scheduler_id, "Scheduler stopped");
        Ok(())
    }

    /// Get current status
    pub fn status(&self) -> SchedulerStatus {
        *self.status.read()
    }

    /// Get the scheduler ID
    pub fn scheduler_id(&self) -> &str {
        &self.config.scheduler_id
    }

    /// Kinds of all registered tasks
    pub fn registered_tasks(&self) -> Vec<TaskKind> {
        let mut kinds: Vec<TaskKind> = self.tasks.read().keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Snapshot of a task's run state
    pub fn task_state(&self, kind: TaskKind) -> Option<TaskRunState> {
        self.tasks.read().get(&kind).map(|t| t.state.lock().clone())
    }

    /// Check if an invocation of the task is in flight
    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.tasks
            .read()
            .get(&kind)
            .is_some_and(|t| t.running.load(Ordering::Acquire))
    }

    fn spawn_loop(&self, entry: Arc<ScheduledTask>) -> JoinHandle<()> {
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let kind = entry.kind();
            let mut delay = entry.schedule.initial_delay();

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.cancelled() => {
                        debug!(task_kind = %kind, "Task loop: shutdown requested");
                        break;
                    }
                }

                let Some(guard) = entry.try_begin() else {
                    debug!(task_kind = %kind, "Previous invocation still running, skipping tick");
                    delay = entry.schedule.interval;
                    continue;
                };

                let outcome = entry.invoke(&shutdown).await;
                drop(guard);

                let failures = entry.state.lock().consecutive_failures;
                delay = entry.schedule.next_delay(&outcome, failures);

                info!(
                    task_kind = %kind,
                    outcome = %outcome,
                    consecutive_failures = failures,
                    next_run_in_ms = delay.as_millis(),
                    "Task invocation finished"
                );
            }

            debug!(task_kind = %kind, "Task loop exited");
        })
    }
}

impl Drop for PeriodicScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::RetryPolicy;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::Notify;

    const KIND: TaskKind = TaskKind::new("scripted");

    /// Task that returns a fixed outcome, optionally parking until released
    struct ScriptedTask {
        outcome: TaskOutcome,
        calls: AtomicUsize,
        release: Option<Arc<Notify>>,
    }

    impl ScriptedTask {
        fn new(outcome: TaskOutcome) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                release: None,
            }
        }

        fn parked(release: Arc<Notify>) -> Self {
            Self {
                release: Some(release),
                ..Self::new(TaskOutcome::Success)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BackgroundTask for ScriptedTask {
        fn kind(&self) -> TaskKind {
            KIND
        }

        async fn run(&self, ctx: &TaskContext) -> TaskOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(release) = &self.release {
                tokio::select! {
                    _ = release.notified() => {}
                    _ = ctx.cancelled() => return TaskOutcome::failure("cancelled"),
                }
            }
            self.outcome.clone()
        }
    }

    fn schedule() -> TaskSchedule {
        TaskSchedule::every(Duration::from_secs(100))
            .with_unavailable_retry_interval(Duration::from_secs(10))
            .with_retry_policy(
                RetryPolicy::exponential()
                    .with_initial_interval(Duration::from_secs(1))
                    .with_jitter(0.0),
            )
    }

    #[test]
    fn test_duplicate_registration() {
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        let task = Arc::new(ScriptedTask::new(TaskOutcome::Success));

        scheduler.register(task.clone(), schedule()).unwrap();
        let result = scheduler.register(task, schedule());

        assert!(matches!(result, Err(SchedulerError::DuplicateTask(k)) if k == KIND));
        assert_eq!(scheduler.registered_tasks(), vec![KIND]);
    }

    #[tokio::test]
    async fn test_trigger_unknown_task() {
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        let result = scheduler.trigger(KIND).await;
        assert_eq!(result, Err(TriggerError::UnknownTask(KIND)));
    }

    #[tokio::test]
    async fn test_trigger_records_state() {
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler
            .register(Arc::new(ScriptedTask::new(TaskOutcome::failure("down"))), schedule())
            .unwrap();

        let outcome = scheduler.trigger(KIND).await.unwrap();
        assert!(outcome.is_failure());

        let state = scheduler.task_state(KIND).unwrap();
        assert_eq!(state.runs, 1);
        assert_eq!(state.consecutive_failures, 1);
        assert!(!scheduler.is_running(KIND));
    }

    #[tokio::test]
    async fn test_overlapping_trigger_is_rejected() {
        let release = Arc::new(Notify::new());
        let scheduler = Arc::new(PeriodicScheduler::new(SchedulerConfig::default()));
        scheduler
            .register(Arc::new(ScriptedTask::parked(release.clone())), schedule())
            .unwrap();

        let first = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.trigger(KIND).await })
        };

        while !scheduler.is_running(KIND) {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            scheduler.trigger(KIND).await,
            Err(TriggerError::AlreadyRunning(KIND))
        );

        release.notify_one();
        assert_eq!(first.await.unwrap(), Ok(TaskOutcome::Success));
        assert!(!scheduler.is_running(KIND));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_uses_unavailable_interval() {
        let task = Arc::new(ScriptedTask::new(TaskOutcome::Retry));
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler.register(task.clone(), schedule()).unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(35)).await;

        // Runs at 0s, 10s, 20s, 30s
        assert_eq!(task.calls(), 4);
        let state = scheduler.task_state(KIND).unwrap();
        assert_eq!(state.consecutive_retries, 4);
        assert_eq!(state.consecutive_failures, 0);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_backs_off_exponentially() {
        let task = Arc::new(ScriptedTask::new(TaskOutcome::failure("remote down")));
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler.register(task.clone(), schedule()).unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        // Runs at 0s, 1s, 3s, 7s
        assert_eq!(task.calls(), 4);
        assert_eq!(scheduler.task_state(KIND).unwrap().consecutive_failures, 4);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_waits_full_interval() {
        let task = Arc::new(ScriptedTask::new(TaskOutcome::Success));
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler.register(task.clone(), schedule()).unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_secs(150)).await;

        // Runs at 0s and 100s
        assert_eq!(task.calls(), 2);
        assert!(scheduler.task_state(KIND).unwrap().last_success_at.is_some());

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_in_flight_invocation() {
        let release = Arc::new(Notify::new());
        let task = Arc::new(ScriptedTask::parked(release));
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler.register(task.clone(), schedule()).unwrap();

        scheduler.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(scheduler.is_running(KIND));

        scheduler.shutdown().await.unwrap();

        assert_eq!(scheduler.status(), SchedulerStatus::Stopped);
        assert_eq!(
            scheduler.task_state(KIND).unwrap().last_outcome,
            Some(TaskOutcome::failure("cancelled"))
        );
        assert_eq!(
            scheduler.trigger(KIND).await,
            Err(TriggerError::ShuttingDown)
        );
    }

    #[tokio::test]
    async fn test_restart_after_shutdown_is_rejected() {
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler
            .register(Arc::new(ScriptedTask::new(TaskOutcome::Success)), schedule())
            .unwrap();

        scheduler.start().unwrap();
        scheduler.shutdown().await.unwrap();

        assert!(matches!(scheduler.start(), Err(SchedulerError::ShutDown)));
        assert_eq!(scheduler.status(), SchedulerStatus::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invocation_budget_is_enforced() {
        let release = Arc::new(Notify::new());
        let task = Arc::new(ScriptedTask::parked(release));
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        let timeouts = crate::reliability::TimeoutConfig::new()
            .with_invocation(Duration::from_secs(5));
        scheduler
            .register(task.clone(), schedule().with_timeouts(timeouts))
            .unwrap();

        let outcome = scheduler.trigger(KIND).await.unwrap();

        assert!(outcome.is_failure());
        assert_eq!(scheduler.task_state(KIND).unwrap().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_register_after_start_is_rejected() {
        let scheduler = PeriodicScheduler::new(SchedulerConfig::default());
        scheduler.start().unwrap();

        let result =
            scheduler.register(Arc::new(ScriptedTask::new(TaskOutcome::Success)), schedule());
        assert!(matches!(result, Err(SchedulerError::AlreadyRunning)));

        scheduler.shutdown().await.unwrap();
    }
}
