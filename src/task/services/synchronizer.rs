//! Status state machine and its creator/assignee propagation rules.
//!
//! Any status may follow any other. What changes is who sees the change:
//!
//! - A creator moves the aggregate status and every assignment with it.
//! - An assignee moves their own assignment, and the aggregate follows on a
//!   best-effort basis.
//!
//! A caller who is both creator and assignee takes the creator path.

use super::{
    access::Participation,
    error::{ForbiddenReason, TaskWorkflowResult},
    notify::{emit, emit_to_others},
    propagation::fan_out_status,
};
use crate::config::WorkflowConfig;
use crate::task::{
    domain::{AssignmentStatus, Identity, Task, TaskId, TaskStatus},
    ports::{Notification, NotificationEmitter, NotificationKind, TaskRepository},
};
use mockable::Clock;
use std::sync::Arc;

/// Applies status transitions and keeps task and assignment statuses in
/// step.
#[derive(Clone)]
pub struct StatusSynchronizer<R, N, C>
where
    R: TaskRepository,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: WorkflowConfig,
}

impl<R, N, C> StatusSynchronizer<R, N, C>
where
    R: TaskRepository,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    /// Creates a synchronizer with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            notifier,
            clock,
            config: WorkflowConfig::default(),
        }
    }

    /// Replaces the workflow tunables.
    #[must_use]
    pub const fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses `status` and applies it on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unknown status, otherwise the
    /// errors of [`Self::apply_status`].
    pub async fn set_status(
        &self,
        task_id: TaskId,
        status: &str,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let status = TaskStatus::try_from(status)?;
        self.apply_status(task_id, status, caller).await
    }

    /// Applies `status` on behalf of `caller`.
    ///
    /// Re-applying the current status is accepted and refreshes the
    /// status-change timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskWorkflowError::NotFound`] for an unknown task,
    /// [`super::TaskWorkflowError::Forbidden`] when the caller is neither creator
    /// nor active assignee, and [`super::TaskWorkflowError::Dependency`] when a
    /// primary write fails.
    pub async fn apply_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let participation = Participation::load(&*self.repository, task_id, caller).await?;
        if participation.is_creator() {
            self.apply_as_creator(participation.task, status, caller).await
        } else if participation.is_active_assignee() {
            self.apply_as_assignee(participation.task, status, caller).await
        } else {
            Err(participation.refuse_outsider(ForbiddenReason::NotParticipant))
        }
    }

    async fn apply_as_creator(
        &self,
        mut task: Task,
        status: TaskStatus,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        task.apply_status(status, &*self.clock);
        self.repository.update(&task).await?;

        let changed = fan_out_status(
            &*self.repository,
            task.id(),
            AssignmentStatus::from(status),
            task.last_status_change_at(),
            self.config.fan_out_attempts(),
        )
        .await?;
        tracing::debug!(task_id = %task.id(), %status, changed, "creator status fanned out");

        match self.repository.list_assignments(task.id()).await {
            Ok(assignments) => {
                let recipients = assignments.iter().map(|assignment| assignment.assignee());
                emit_to_others(
                    &*self.notifier,
                    recipients,
                    caller,
                    NotificationKind::TaskStatusChanged,
                    &task,
                )
                .await;
            }
            Err(err) => tracing::warn!(
                task_id = %task.id(),
                error = %err,
                "could not list assignees to notify"
            ),
        }
        Ok(task)
    }

    async fn apply_as_assignee(
        &self,
        mut task: Task,
        status: TaskStatus,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let at = self.clock.utc();
        self.repository
            .set_assignment_status(task.id(), caller, AssignmentStatus::from(status), at)
            .await?;

        task.apply_status(status, &*self.clock);
        if let Err(err) = self.repository.update(&task).await {
            tracing::warn!(
                task_id = %task.id(),
                %status,
                error = %err,
                "assignment updated but aggregate status write failed"
            );
        }

        let notification = Notification::about_task(
            task.created_by().clone(),
            NotificationKind::TaskStatusChanged,
            &task,
        )
        .with_actor(caller);
        emit(&*self.notifier, notification).await;
        Ok(task)
    }
}
