//! Repository port for task and assignment persistence.

use crate::task::domain::{Assignment, AssignmentStatus, ColumnPlacement, Identity, Task, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task and assignment persistence contract.
///
/// Each method is a single atomic write or read. Callers that need several
/// rows to change together issue several calls and tolerate the window
/// between them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task together with its initial assignments.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists or [`TaskRepositoryError::DuplicateAssignment`] when the
    /// assignment list repeats an assignee.
    async fn create(&self, task: &Task, assignments: &[Assignment]) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task row.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns non-hidden tasks that `identity` created or holds an active
    /// assignment on, each task once.
    async fn list_visible_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns non-hidden tasks on which `identity` holds an active
    /// assignment.
    async fn list_assigned_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns root recurring tasks that are not hidden and whose due date is
    /// before `now`.
    async fn list_due_recurring(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>>;

    /// Rewrites the rank of several tasks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when a placement names a
    /// missing task.
    async fn update_positions(
        &self,
        placements: &[ColumnPlacement],
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()>;

    /// Returns every assignment of a task, ordered by assignee.
    async fn list_assignments(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Assignment>>;

    /// Finds the assignment linking `assignee` to a task.
    async fn find_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<Option<Assignment>>;

    /// Adds one assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateAssignment`] when the pair
    /// already exists.
    async fn add_assignment(&self, assignment: &Assignment) -> TaskRepositoryResult<()>;

    /// Deletes one assignment.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::AssignmentNotFound`] when the pair does
    /// not exist.
    async fn remove_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<()>;

    /// Sets one assignee's status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::AssignmentNotFound`] when the pair does
    /// not exist.
    async fn set_assignment_status(
        &self,
        task_id: TaskId,
        assignee: &Identity,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()>;

    /// Sets the status of every assignment of a task and returns how many
    /// rows changed.
    async fn set_all_assignment_statuses(
        &self,
        task_id: TaskId,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The assignee is already assigned to the task.
    #[error("{assignee} is already assigned to task {task_id}")]
    DuplicateAssignment {
        /// Task the assignment belongs to.
        task_id: TaskId,
        /// Repeated assignee.
        assignee: Identity,
    },

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The assignment was not found.
    #[error("{assignee} is not assigned to task {task_id}")]
    AssignmentNotFound {
        /// Task the assignment was looked up on.
        task_id: TaskId,
        /// Missing assignee.
        assignee: Identity,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
