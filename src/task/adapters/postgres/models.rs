//! Diesel row models for task workflow persistence.

use super::schema::{task_assignments, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Priority label.
    pub priority: String,
    /// Aggregate status label.
    pub status: String,
    /// Column rank.
    pub position: i64,
    /// Time of the latest status transition.
    pub last_status_change_at: DateTime<Utc>,
    /// Optional snooze deadline.
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Recurrence flag.
    pub is_recurring: bool,
    /// Recurrence rule text.
    pub recurrence_rule: Option<String>,
    /// Originating recurring task.
    pub parent_task_id: Option<uuid::Uuid>,
    /// Source channel.
    pub channel: Option<String>,
    /// Creator identity.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
///
/// `None` writes `NULL` on update so cleared fields stay cleared.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct NewTaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Priority label.
    pub priority: String,
    /// Aggregate status label.
    pub status: String,
    /// Column rank.
    pub position: i64,
    /// Time of the latest status transition.
    pub last_status_change_at: DateTime<Utc>,
    /// Optional snooze deadline.
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Recurrence flag.
    pub is_recurring: bool,
    /// Recurrence rule text.
    pub recurrence_rule: Option<String>,
    /// Originating recurring task.
    pub parent_task_id: Option<uuid::Uuid>,
    /// Source channel.
    pub channel: Option<String>,
    /// Creator identity.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row for task assignments, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    /// Task the assignment belongs to.
    pub task_id: uuid::Uuid,
    /// Assignee identity.
    pub assignee: String,
    /// Assignee status label.
    pub status: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
