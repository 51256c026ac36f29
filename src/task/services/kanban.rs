//! Drag-and-drop moves on the Kanban board.

use super::{
    access::Participation,
    error::{TaskValidationError, TaskWorkflowResult},
    propagation::fan_out_status,
};
use crate::config::WorkflowConfig;
use crate::task::{
    domain::{
        AssignmentStatus, ColumnPlacement, Identity, KanbanColumn, Task, TaskId, TaskStatus,
        plan_column_placements,
    },
    ports::TaskRepository,
};
use mockable::Clock;
use std::sync::Arc;

/// Records board moves made by assignees.
#[derive(Clone)]
pub struct KanbanPositioner<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    config: WorkflowConfig,
}

impl<R, C> KanbanPositioner<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a positioner with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
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

    /// Parses `column` and moves the task there.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `column` is not a status or names
    /// `hidden`, otherwise the errors of [`Self::move_to_column`].
    pub async fn move_kanban(
        &self,
        task_id: TaskId,
        column: &str,
        position: i64,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let status = TaskStatus::try_from(column)?;
        let column = KanbanColumn::try_from(status).map_err(TaskValidationError::from)?;
        self.move_to_column(task_id, column, position, caller).await
    }

    /// Moves a task to `position` within `column`.
    ///
    /// The caller's other tasks in the column are renumbered densely around
    /// the moved task. The status change fans out to every assignment.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskWorkflowError::NotFound`] for an unknown task,
    /// [`super::TaskWorkflowError::Forbidden`] unless the caller holds an
    /// active assignment, and [`super::TaskWorkflowError::Dependency`] when a
    /// write fails.
    pub async fn move_to_column(
        &self,
        task_id: TaskId,
        column: KanbanColumn,
        position: i64,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let Participation { mut task, .. } =
            Participation::load(&*self.repository, task_id, caller)
                .await?
                .require_assignee()?;

        let status = column.status();
        let siblings: Vec<Task> = self
            .repository
            .list_visible_to(caller)
            .await?
            .into_iter()
            .filter(|sibling| sibling.status() == status)
            .collect();
        let placements = plan_column_placements(&siblings, task_id, position);
        let rank = placements
            .iter()
            .find(|placement| placement.task_id == task_id)
            .map_or(0, |placement| placement.position);

        task.move_to(status, rank, &*self.clock);
        self.repository.update(&task).await?;

        let shifted = shifted_siblings(&siblings, &placements, task_id);
        if !shifted.is_empty() {
            self.repository
                .update_positions(&shifted, task.updated_at())
                .await?;
        }

        fan_out_status(
            &*self.repository,
            task_id,
            AssignmentStatus::from(status),
            task.last_status_change_at(),
            self.config.fan_out_attempts(),
        )
        .await?;

        tracing::debug!(
            task_id = %task_id,
            %column,
            position = rank,
            shifted = shifted.len(),
            "task moved on board"
        );
        Ok(task)
    }
}

/// Keeps only placements that change a sibling's stored rank.
fn shifted_siblings(
    siblings: &[Task],
    placements: &[ColumnPlacement],
    moved: TaskId,
) -> Vec<ColumnPlacement> {
    placements
        .iter()
        .filter(|placement| placement.task_id != moved)
        .filter(|placement| {
            siblings
                .iter()
                .find(|sibling| sibling.id() == placement.task_id)
                .is_some_and(|sibling| sibling.position() != placement.position)
        })
        .copied()
        .collect()
}
