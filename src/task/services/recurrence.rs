//! Regeneration of recurring tasks whose due date has passed.

use super::{
    error::{TaskWorkflowError, TaskWorkflowResult},
    notify::emit,
};
use crate::config::WorkflowConfig;
use crate::task::{
    domain::{Assignment, Task, calculate_next_occurrence},
    ports::{
        Notification, NotificationEmitter, NotificationKind, TaskRepository, TaskRepositoryResult,
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of one recurrence sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecurrenceSweepReport {
    /// Tasks that produced a new instance.
    pub processed: usize,
    /// Tasks whose regeneration failed.
    pub errors: usize,
    /// Tasks with no computable next occurrence.
    pub skipped: usize,
    /// Due recurring tasks found.
    pub total: usize,
}

enum Regeneration {
    Spawned(Task),
    Skipped,
}

/// Spawns the next instance of each overdue recurring task.
///
/// The original task stays the root of the series: its due date moves to
/// the new occurrence and every instance points back at it.
#[derive(Clone)]
pub struct RecurrenceRegenerator<R, N, C>
where
    R: TaskRepository,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: WorkflowConfig,
    sweep_guard: Arc<Mutex<()>>,
}

impl<R, N, C> RecurrenceRegenerator<R, N, C>
where
    R: TaskRepository,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    /// Creates a regenerator with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
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

    /// Computes the next due date for a rule, using the configured
    /// lookahead.
    #[must_use]
    pub fn next_occurrence(&self, rule: &str, due: DateTime<Utc>) -> Option<DateTime<Utc>> {
        calculate_next_occurrence(rule, due, self.config.recurrence_lookahead())
    }

    /// Regenerates every recurring root task that is overdue.
    ///
    /// A failure on one task is logged and counted and the sweep moves on.
    ///
    /// # Errors
    ///
    /// Returns [`TaskWorkflowError::SweepAlreadyRunning`] when another sweep
    /// on this regenerator has not finished, and
    /// [`TaskWorkflowError::Dependency`] when due tasks cannot be listed.
    pub async fn run_recurrence_sweep(&self) -> TaskWorkflowResult<RecurrenceSweepReport> {
        let _running = self
            .sweep_guard
            .try_lock()
            .map_err(|_| TaskWorkflowError::SweepAlreadyRunning)?;

        let now = self.clock.utc();
        let due_tasks = self.repository.list_due_recurring(now).await?;
        let mut report = RecurrenceSweepReport {
            total: due_tasks.len(),
            ..RecurrenceSweepReport::default()
        };

        for task in &due_tasks {
            match self.regenerate(task).await {
                Ok(Regeneration::Spawned(instance)) => {
                    report.processed += 1;
                    tracing::debug!(
                        task_id = %task.id(),
                        instance_id = %instance.id(),
                        "recurring task regenerated"
                    );
                }
                Ok(Regeneration::Skipped) => report.skipped += 1,
                Err(err) => {
                    report.errors += 1;
                    tracing::error!(task_id = %task.id(), error = %err, "regeneration failed");
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            errors = report.errors,
            skipped = report.skipped,
            total = report.total,
            "recurrence sweep finished"
        );
        Ok(report)
    }

    async fn regenerate(&self, task: &Task) -> TaskRepositoryResult<Regeneration> {
        let (Some(rule), Some(due)) = (task.recurrence_rule(), task.due_date()) else {
            tracing::warn!(task_id = %task.id(), "recurring task lacks a rule or due date");
            return Ok(Regeneration::Skipped);
        };
        let Some(next_due) = self.next_occurrence(rule, due) else {
            tracing::warn!(task_id = %task.id(), rule, "no next occurrence for rule");
            return Ok(Regeneration::Skipped);
        };

        let instance = task.spawn_occurrence(next_due, &*self.clock);
        let assignments: Vec<Assignment> = self
            .repository
            .list_assignments(task.id())
            .await?
            .iter()
            .map(|assignment| assignment.carry_over(instance.id(), &*self.clock))
            .collect();
        self.repository.create(&instance, &assignments).await?;

        let mut root = task.clone();
        root.advance_due_date(next_due, &*self.clock);
        self.repository.update(&root).await?;

        for assignment in &assignments {
            let notification = Notification::about_task(
                assignment.assignee().clone(),
                NotificationKind::TaskRecurred,
                &instance,
            );
            emit(&*self.notifier, notification).await;
        }
        Ok(Regeneration::Spawned(instance))
    }
}
