//! Staleness detection, snoozing, and the stale-task notification sweep.

use super::{
    access::Participation,
    error::{TaskWorkflowError, TaskWorkflowResult},
    notify::emit,
};
use crate::config::WorkflowConfig;
use crate::task::{
    domain::{Identity, Task, TaskId, board_order},
    ports::{
        IdentityDirectory, Notification, NotificationEmitter, NotificationKind, TaskRepository,
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Returns `true` when `task` needs follow-up at `now`.
///
/// Done and hidden tasks are never stale, nor are snoozed ones. A task whose
/// status changed exactly `threshold` ago is stale.
#[must_use]
pub fn is_stale_task(task: &Task, now: DateTime<Utc>, threshold: TimeDelta) -> bool {
    task.is_stale_at(now, threshold)
}

/// Outcome of one staleness sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StalenessSweepReport {
    /// Approved identities examined.
    pub identities: usize,
    /// Stale-task notifications accepted by the emitter.
    pub notified: usize,
    /// Identities or notifications that failed.
    pub errors: usize,
}

/// Finds stale tasks and lets assignees snooze them.
#[derive(Clone)]
pub struct StalenessDetector<R, D, N, C>
where
    R: TaskRepository,
    D: IdentityDirectory,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: WorkflowConfig,
    sweep_guard: Arc<Mutex<()>>,
}

impl<R, D, N, C> StalenessDetector<R, D, N, C>
where
    R: TaskRepository,
    D: IdentityDirectory,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    /// Creates a detector with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            directory,
            notifier,
            clock,
            config: WorkflowConfig::default(),
            sweep_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the workflow tunables.
    #[must_use]
    pub const fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Suppresses staleness for the configured snooze duration.
    ///
    /// Status and position are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::NotFound`] for an unknown task,
    /// [`TaskWorkflowError::Forbidden`] unless the caller holds an active
    /// assignment, and [`TaskWorkflowError::Dependency`] when the write
    /// fails.
    pub async fn snooze(&self, task_id: TaskId, caller: &Identity) -> TaskWorkflowResult<Task> {
        let Participation { mut task, .. } =
            Participation::load(&*self.repository, task_id, caller)
                .await?
                .require_assignee()?;
        let until = self.clock.utc() + self.config.snooze_duration();
        task.snooze_until(until, &*self.clock);
        self.repository.update(&task).await?;
        tracing::debug!(task_id = %task_id, %caller, %until, "task snoozed");
        Ok(task)
    }

    /// Returns the stale tasks among those `identity` is assigned to, in
    /// board order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::Dependency`] when the tasks cannot be
    /// read.
    pub async fn list_stale_tasks_for(
        &self,
        identity: &Identity,
    ) -> TaskWorkflowResult<Vec<Task>> {
        let now = self.clock.utc();
        let threshold = self.config.stale_after();
        let mut stale: Vec<Task> = self
            .repository
            .list_assigned_to(identity)
            .await?
            .into_iter()
            .filter(|task| is_stale_task(task, now, threshold))
            .collect();
        stale.sort_by(board_order);
        Ok(stale)
    }

    /// Notifies every approved user about each of their stale tasks.
    ///
    /// One notification is requested per stale task per run; suppressing
    /// repeats across runs is the emitter's concern.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::SweepAlreadyRunning`] when another sweep
    /// on this detector has not finished, and
    /// [`TaskWorkflowError::Dependency`] when the directory cannot list
    /// users. Failures for a single user are counted, not returned.
    pub async fn run_staleness_sweep(&self) -> TaskWorkflowResult<StalenessSweepReport> {
        let _running = self
            .sweep_guard
            .try_lock()
            .map_err(|_| TaskWorkflowError::SweepAlreadyRunning)?;

        let identities = self.directory.list_approved().await?;
        let mut report = StalenessSweepReport {
            identities: identities.len(),
            ..StalenessSweepReport::default()
        };

        for identity in &identities {
            match self.list_stale_tasks_for(identity).await {
                Ok(tasks) => self.notify_stale(identity, &tasks, &mut report).await,
                Err(err) => {
                    tracing::error!(%identity, error = %err, "staleness check failed");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            identities = report.identities,
            notified = report.notified,
            errors = report.errors,
            "staleness sweep finished"
        );
        Ok(report)
    }

    async fn notify_stale(
        &self,
        identity: &Identity,
        tasks: &[Task],
        report: &mut StalenessSweepReport,
    ) {
        for task in tasks {
            let notification =
                Notification::about_task(identity.clone(), NotificationKind::TaskStale, task);
            if emit(&*self.notifier, notification).await {
                report.notified += 1;
            } else {
                report.errors += 1;
            }
        }
    }
}
