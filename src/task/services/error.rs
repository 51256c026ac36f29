//! Service-level errors shared by every task workflow operation.

use crate::task::{
    domain::{ParseTaskStatusError, TaskDomainError, TaskId},
    ports::{IdentityDirectoryError, TaskRepositoryError},
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable classification of a [`TaskWorkflowError`] for API mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed validation.
    ValidationError,
    /// The caller may not perform the operation.
    Forbidden,
    /// The task does not exist.
    NotFound,
    /// A collaborator such as the datastore failed.
    DependencyFailure,
    /// The operation conflicts with one already in progress.
    Conflict,
}

impl ErrorKind {
    /// Returns the stable error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::DependencyFailure => "dependency_failure",
            Self::Conflict => "conflict",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an assignee entry was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeRejection {
    /// The entry is neither an address nor a team tag.
    Malformed,
    /// The address does not belong to a registered user.
    Unregistered,
}

impl fmt::Display for AssigneeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Malformed => "malformed",
            Self::Unregistered => "not registered",
        })
    }
}

/// One refused assignee entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedAssignee {
    /// Entry as supplied by the caller.
    pub entry: String,
    /// Reason for the refusal.
    pub reason: AssigneeRejection,
}

impl fmt::Display for RejectedAssignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.entry, self.reason)
    }
}

/// Input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    /// A domain value could not be constructed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// One or more assignee entries were refused; every offender is listed.
    #[error("invalid assignees: {}", format_rejections(.0))]
    InvalidAssignees(Vec<RejectedAssignee>),

    /// The requested status is not a known status.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),
}

fn format_rejections(rejections: &[RejectedAssignee]) -> String {
    rejections
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why an operation was refused to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    /// Only the creator may perform the operation.
    NotCreator,
    /// The caller is neither the creator nor an active assignee.
    NotParticipant,
    /// Only an active assignee may perform the operation.
    NotAssignee,
    /// The creator deleted the task; only they may act on it.
    TaskHidden,
}

impl fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotCreator => "only the creator may do this",
            Self::NotParticipant => "caller is neither creator nor assignee",
            Self::NotAssignee => "only an assignee may do this",
            Self::TaskHidden => "the task was deleted by its creator",
        })
    }
}

/// Collaborator failures surfaced to callers.
#[derive(Debug, Clone, Error)]
pub enum DependencyFailure {
    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// The identity directory failed.
    #[error(transparent)]
    Directory(#[from] IdentityDirectoryError),
}

/// Errors returned by task workflow services.
#[derive(Debug, Clone, Error)]
pub enum TaskWorkflowError {
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(#[from] TaskValidationError),

    /// The caller may not act on the task.
    #[error("forbidden on task {task_id}: {reason}")]
    Forbidden {
        /// Task the caller tried to act on.
        task_id: TaskId,
        /// Why the caller was refused.
        reason: ForbiddenReason,
    },

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A collaborator failed while performing a primary write or read.
    #[error("dependency failure: {0}")]
    Dependency(#[source] DependencyFailure),

    /// A sweep of the same kind is already running in this process.
    #[error("a sweep of this kind is already running")]
    SweepAlreadyRunning,
}

impl TaskWorkflowError {
    /// Returns the stable classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationError,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Dependency(_) => ErrorKind::DependencyFailure,
            Self::SweepAlreadyRunning => ErrorKind::Conflict,
        }
    }

    pub(crate) const fn forbidden(task_id: TaskId, reason: ForbiddenReason) -> Self {
        Self::Forbidden { task_id, reason }
    }
}

impl From<TaskRepositoryError> for TaskWorkflowError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(task_id)
            | TaskRepositoryError::AssignmentNotFound { task_id, .. } => Self::NotFound(task_id),
            other => Self::Dependency(DependencyFailure::Repository(other)),
        }
    }
}

impl From<IdentityDirectoryError> for TaskWorkflowError {
    fn from(err: IdentityDirectoryError) -> Self {
        Self::Dependency(DependencyFailure::Directory(err))
    }
}

impl From<TaskDomainError> for TaskWorkflowError {
    fn from(err: TaskDomainError) -> Self {
        Self::Validation(TaskValidationError::Domain(err))
    }
}

impl From<ParseTaskStatusError> for TaskWorkflowError {
    fn from(err: ParseTaskStatusError) -> Self {
        Self::Validation(TaskValidationError::InvalidStatus(err))
    }
}

/// Result type for task workflow operations.
pub type TaskWorkflowResult<T> = Result<T, TaskWorkflowError>;
