//! Caller roles on a task.

use super::error::{ForbiddenReason, TaskWorkflowError, TaskWorkflowResult};
use crate::task::{
    domain::{Assignment, Identity, Task, TaskId, TaskStatus},
    ports::TaskRepository,
};

/// A task together with the caller's relationship to it.
#[derive(Debug, Clone)]
pub(super) struct Participation {
    pub(super) task: Task,
    assignment: Option<Assignment>,
    is_creator: bool,
}

impl Participation {
    /// Loads a task and the caller's assignment on it.
    pub(super) async fn load<R>(
        repository: &R,
        task_id: TaskId,
        caller: &Identity,
    ) -> TaskWorkflowResult<Self>
    where
        R: TaskRepository + ?Sized,
    {
        let task = repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskWorkflowError::NotFound(task_id))?;
        let assignment = repository.find_assignment(task_id, caller).await?;
        let is_creator = task.is_created_by(caller);
        Ok(Self {
            task,
            assignment,
            is_creator,
        })
    }

    pub(super) const fn is_creator(&self) -> bool {
        self.is_creator
    }

    /// Assignments on a hidden task confer no rights.
    pub(super) fn is_active_assignee(&self) -> bool {
        !self.is_hidden() && self.assignment.as_ref().is_some_and(Assignment::is_active)
    }

    fn is_hidden(&self) -> bool {
        self.task.status() == TaskStatus::Hidden
    }

    /// Fails unless the caller created the task.
    pub(super) fn require_creator(self) -> TaskWorkflowResult<Self> {
        if self.is_creator {
            Ok(self)
        } else {
            Err(self.refuse(ForbiddenReason::NotCreator))
        }
    }

    /// Fails unless the caller holds an active assignment.
    pub(super) fn require_assignee(self) -> TaskWorkflowResult<Self> {
        if self.is_active_assignee() {
            Ok(self)
        } else {
            Err(self.refuse_outsider(ForbiddenReason::NotAssignee))
        }
    }

    /// Fails unless the caller is the creator or an active assignee.
    pub(super) fn require_participant(self) -> TaskWorkflowResult<Self> {
        if self.is_creator || self.is_active_assignee() {
            Ok(self)
        } else {
            Err(self.refuse_outsider(ForbiddenReason::NotParticipant))
        }
    }

    /// Refuses a caller who is not the creator, reporting a hidden task as
    /// such.
    pub(super) fn refuse_outsider(&self, reason: ForbiddenReason) -> TaskWorkflowError {
        if self.is_hidden() && !self.is_creator {
            self.refuse(ForbiddenReason::TaskHidden)
        } else {
            self.refuse(reason)
        }
    }

    const fn refuse(&self, reason: ForbiddenReason) -> TaskWorkflowError {
        TaskWorkflowError::forbidden(self.task.id(), reason)
    }
}
