//! Per-assignee progress records.

use super::{AssignmentStatus, Identity, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Link between a task and one assignee, carrying that assignee's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    task_id: TaskId,
    assignee: Identity,
    status: AssignmentStatus,
    updated_at: DateTime<Utc>,
}

impl Assignment {
    /// Creates a backlog assignment.
    #[must_use]
    pub fn new(task_id: TaskId, assignee: Identity, clock: &impl Clock) -> Self {
        Self {
            task_id,
            assignee,
            status: AssignmentStatus::Backlog,
            updated_at: clock.utc(),
        }
    }

    /// Reconstructs an assignment from persisted storage.
    #[must_use]
    pub const fn from_persisted(
        task_id: TaskId,
        assignee: Identity,
        status: AssignmentStatus,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            assignee,
            status,
            updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the assignee identity.
    #[must_use]
    pub const fn assignee(&self) -> &Identity {
        &self.assignee
    }

    /// Returns the assignee's status.
    #[must_use]
    pub const fn status(&self) -> AssignmentStatus {
        self.status
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` while the assignment grants access to its task.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Sets the assignee's status.
    pub fn set_status(&mut self, status: AssignmentStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
    }

    /// Copies this assignment onto another task, resetting progress.
    #[must_use]
    pub fn carry_over(&self, task_id: TaskId, clock: &impl Clock) -> Self {
        Self::new(task_id, self.assignee.clone(), clock)
    }
}
