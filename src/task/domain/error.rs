//! Error types for task domain validation and parsing.

use super::TaskStatus;
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The identity is not a plausible e-mail address.
    #[error("invalid identity '{0}', expected an e-mail address")]
    InvalidIdentity(String),

    /// The team tag has no usable team name.
    #[error("invalid team tag '{0}', expected team:<NAME>")]
    InvalidTeamTag(String),

    /// The status is not one of the Kanban board columns.
    #[error("status '{0}' is not a Kanban column")]
    NotAKanbanColumn(TaskStatus),

    /// The recurrence rule is neither structured nor a known frequency.
    #[error("unusable recurrence rule '{0}'")]
    InvalidRecurrenceRule(String),

    /// A recurring task was requested without a due date to advance.
    #[error("recurring tasks require a due date")]
    RecurrenceWithoutDueDate,
}

/// Error returned while parsing task or assignment statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Errors returned while parsing a structured recurrence rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecurrenceRuleError {
    /// The rule text is empty.
    #[error("recurrence rule is empty")]
    Empty,

    /// A rule part is not in `KEY=VALUE` form.
    #[error("malformed rule part '{0}'")]
    MalformedPart(String),

    /// The rule has no `FREQ` part.
    #[error("recurrence rule has no FREQ")]
    MissingFrequency,

    /// The `FREQ` value is not supported.
    #[error("unsupported frequency '{0}'")]
    UnsupportedFrequency(String),

    /// The `INTERVAL` value is not a positive integer.
    #[error("invalid interval '{0}'")]
    InvalidInterval(String),

    /// A `BYDAY` entry is not a two-letter weekday.
    #[error("invalid weekday '{0}'")]
    InvalidWeekday(String),

    /// The `BYMONTHDAY` value is outside 1..=31.
    #[error("invalid day of month '{0}'")]
    InvalidMonthDay(String),

    /// The `UNTIL` value is not a recognised date or date-time.
    #[error("invalid UNTIL value '{0}'")]
    InvalidUntil(String),
}
