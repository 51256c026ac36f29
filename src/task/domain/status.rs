//! Workflow statuses for tasks, assignments, and board columns.
//!
//! Task and assignment statuses share a value set but carry different
//! meaning: [`TaskStatus`] is the aggregate the creator and the board see,
//! [`AssignmentStatus`] is one assignee's own progress. Conversions between
//! them are explicit.

use super::{ParseTaskStatusError, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

fn parse_status_str(value: &str) -> Option<TaskStatus> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "backlog" => Some(TaskStatus::Backlog),
        "in_progress" => Some(TaskStatus::InProgress),
        "review" => Some(TaskStatus::Review),
        "done" => Some(TaskStatus::Done),
        "hidden" => Some(TaskStatus::Hidden),
        _ => None,
    }
}

/// Aggregate workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not started.
    #[default]
    Backlog,
    /// Work is under way.
    InProgress,
    /// Work is awaiting review.
    Review,
    /// Work is complete.
    Done,
    /// The task has been soft-deleted.
    Hidden,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Hidden => "hidden",
        }
    }

    /// Returns `true` for statuses that no longer need follow-up.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Done | Self::Hidden)
    }

    /// Returns the board column for this status, if it has one.
    #[must_use]
    pub const fn column(self) -> Option<KanbanColumn> {
        match self {
            Self::Backlog => Some(KanbanColumn::Backlog),
            Self::InProgress => Some(KanbanColumn::InProgress),
            Self::Review => Some(KanbanColumn::Review),
            Self::Done => Some(KanbanColumn::Done),
            Self::Hidden => None,
        }
    }

    const fn from_assignment(value: AssignmentStatus) -> Self {
        match value {
            AssignmentStatus::Backlog => Self::Backlog,
            AssignmentStatus::InProgress => Self::InProgress,
            AssignmentStatus::Review => Self::Review,
            AssignmentStatus::Done => Self::Done,
            AssignmentStatus::Hidden => Self::Hidden,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_status_str(value).ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}

impl From<AssignmentStatus> for TaskStatus {
    fn from(value: AssignmentStatus) -> Self {
        Self::from_assignment(value)
    }
}

/// One assignee's own progress on a shared task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Work has not started.
    #[default]
    Backlog,
    /// Work is under way.
    InProgress,
    /// Work is awaiting review.
    Review,
    /// Work is complete.
    Done,
    /// The assignment is no longer active.
    Hidden,
}

impl AssignmentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        TaskStatus::from_assignment(self).as_str()
    }

    /// Returns `true` while the assignment still grants access to the task.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AssignmentStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_status_str(value)
            .map(Self::from)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}

impl From<TaskStatus> for AssignmentStatus {
    fn from(value: TaskStatus) -> Self {
        match value {
            TaskStatus::Backlog => Self::Backlog,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::Review => Self::Review,
            TaskStatus::Done => Self::Done,
            TaskStatus::Hidden => Self::Hidden,
        }
    }
}

/// Column of the Kanban board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    /// Not started.
    Backlog,
    /// Under way.
    InProgress,
    /// Awaiting review.
    Review,
    /// Complete.
    Done,
}

impl KanbanColumn {
    /// Returns the task status a task in this column carries.
    #[must_use]
    pub const fn status(self) -> TaskStatus {
        match self {
            Self::Backlog => TaskStatus::Backlog,
            Self::InProgress => TaskStatus::InProgress,
            Self::Review => TaskStatus::Review,
            Self::Done => TaskStatus::Done,
        }
    }

    /// Returns the zero-based board order of this column.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Backlog => 0,
            Self::InProgress => 1,
            Self::Review => 2,
            Self::Done => 3,
        }
    }
}

impl fmt::Display for KanbanColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status().as_str())
    }
}

impl TryFrom<TaskStatus> for KanbanColumn {
    type Error = TaskDomainError;

    fn try_from(value: TaskStatus) -> Result<Self, Self::Error> {
        value
            .column()
            .ok_or(TaskDomainError::NotAKanbanColumn(value))
    }
}
