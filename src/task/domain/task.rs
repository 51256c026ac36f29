//! Task aggregate root and the validated content it is created from.

use super::{Identity, TaskDomainError, TaskId, TaskPriority, TaskStatus, is_usable_rule};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Validated content for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: TaskPriority,
    recurrence_rule: Option<String>,
    channel: Option<String>,
}

impl TaskDraft {
    /// Creates a draft with the required title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, TaskDomainError> {
        Ok(Self {
            title: normalize_title(title)?,
            description: None,
            due_date: None,
            priority: TaskPriority::default(),
            recurrence_rule: None,
            channel: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the task as recurring under the given rule.
    #[must_use]
    pub fn with_recurrence(mut self, rule: impl Into<String>) -> Self {
        self.recurrence_rule = Some(rule.into());
        self
    }

    /// Sets the conversation channel the task was derived from.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    fn validate_recurrence(&self) -> Result<(), TaskDomainError> {
        let Some(rule) = self.recurrence_rule.as_deref() else {
            return Ok(());
        };
        if self.due_date.is_none() {
            return Err(TaskDomainError::RecurrenceWithoutDueDate);
        }
        if !is_usable_rule(rule) {
            return Err(TaskDomainError::InvalidRecurrenceRule(rule.to_owned()));
        }
        Ok(())
    }
}

fn normalize_title(title: impl Into<String>) -> Result<String, TaskDomainError> {
    let raw = title.into();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    Ok(trimmed.to_owned())
}

/// Creator-owned content changes applied by an edit.
///
/// `None` leaves a field untouched; for optional fields `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement or cleared description.
    pub description: Option<Option<String>>,
    /// Replacement or cleared due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Replacement priority.
    pub priority: Option<TaskPriority>,
}

impl TaskEdit {
    /// Returns `true` when the edit changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
    }
}

/// Task (reminder) aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: TaskPriority,
    status: TaskStatus,
    position: i64,
    last_status_change_at: DateTime<Utc>,
    snoozed_until: Option<DateTime<Utc>>,
    is_recurring: bool,
    recurrence_rule: Option<String>,
    parent_task_id: Option<TaskId>,
    channel: Option<String>,
    created_by: Identity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted aggregate status.
    pub status: TaskStatus,
    /// Persisted column rank.
    pub position: i64,
    /// Persisted time of the latest status transition.
    pub last_status_change_at: DateTime<Utc>,
    /// Persisted snooze deadline.
    pub snoozed_until: Option<DateTime<Utc>>,
    /// Persisted recurrence flag.
    pub is_recurring: bool,
    /// Persisted recurrence rule text.
    pub recurrence_rule: Option<String>,
    /// Persisted originating recurring task.
    pub parent_task_id: Option<TaskId>,
    /// Persisted source channel.
    pub channel: Option<String>,
    /// Persisted creator identity.
    pub created_by: Identity,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new backlog task owned by `creator`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::RecurrenceWithoutDueDate`] or
    /// [`TaskDomainError::InvalidRecurrenceRule`] when a recurrence rule is
    /// present but cannot drive regeneration.
    pub fn new(
        draft: TaskDraft,
        creator: Identity,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        draft.validate_recurrence()?;
        let timestamp = clock.utc();
        let TaskDraft {
            title,
            description,
            due_date,
            priority,
            recurrence_rule,
            channel,
        } = draft;

        Ok(Self {
            id: TaskId::new(),
            title,
            description,
            due_date,
            priority,
            status: TaskStatus::Backlog,
            position: 0,
            last_status_change_at: timestamp,
            snoozed_until: None,
            is_recurring: recurrence_rule.is_some(),
            recurrence_rule,
            parent_task_id: None,
            channel,
            created_by: creator,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            priority: data.priority,
            status: data.status,
            position: data.position,
            last_status_change_at: data.last_status_change_at,
            snoozed_until: data.snoozed_until,
            is_recurring: data.is_recurring,
            recurrence_rule: data.recurrence_rule,
            parent_task_id: data.parent_task_id,
            channel: data.channel,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the aggregate status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the rank within the task's board column.
    #[must_use]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// Returns when the status last changed.
    #[must_use]
    pub const fn last_status_change_at(&self) -> DateTime<Utc> {
        self.last_status_change_at
    }

    /// Returns the snooze deadline, if any.
    #[must_use]
    pub const fn snoozed_until(&self) -> Option<DateTime<Utc>> {
        self.snoozed_until
    }

    /// Returns whether the task recurs.
    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    /// Returns the recurrence rule text, if any.
    #[must_use]
    pub fn recurrence_rule(&self) -> Option<&str> {
        self.recurrence_rule.as_deref()
    }

    /// Returns the recurring task this instance was spawned from.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<TaskId> {
        self.parent_task_id
    }

    /// Returns the source channel, if any.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Returns the creator identity.
    #[must_use]
    pub const fn created_by(&self) -> &Identity {
        &self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when `identity` created this task.
    #[must_use]
    pub fn is_created_by(&self, identity: &Identity) -> bool {
        &self.created_by == identity
    }

    /// Returns `true` while a snooze deadline lies in the future.
    #[must_use]
    pub fn is_snoozed_at(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until > now)
    }

    /// Returns `true` when the task needs follow-up at `now`.
    ///
    /// A task is stale when it is neither done nor hidden, is not snoozed,
    /// and its status has not changed for at least `threshold`.
    #[must_use]
    pub fn is_stale_at(&self, now: DateTime<Utc>, threshold: TimeDelta) -> bool {
        !self.status.is_settled()
            && !self.is_snoozed_at(now)
            && now.signed_duration_since(self.last_status_change_at) >= threshold
    }

    /// Sets the aggregate status.
    ///
    /// Every accepted transition refreshes the status-change timestamp,
    /// including a transition to the current status.
    pub fn apply_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.status = status;
        self.last_status_change_at = timestamp;
        self.updated_at = timestamp;
    }

    /// Places the task at `position` with the given status.
    pub fn move_to(&mut self, status: TaskStatus, position: i64, clock: &impl Clock) {
        self.position = position;
        self.apply_status(status, clock);
    }

    /// Records the rank given to the task by a column renumbering at `at`.
    pub const fn place(&mut self, position: i64, at: DateTime<Utc>) {
        self.position = position;
        self.updated_at = at;
    }

    /// Suppresses staleness until `until`.
    pub fn snooze_until(&mut self, until: DateTime<Utc>, clock: &impl Clock) {
        self.snoozed_until = Some(until);
        self.touch(clock);
    }

    /// Soft-deletes the task.
    pub fn hide(&mut self, clock: &impl Clock) {
        self.apply_status(TaskStatus::Hidden, clock);
    }

    /// Applies creator-owned content changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank replacement title
    /// and [`TaskDomainError::RecurrenceWithoutDueDate`] when clearing the due
    /// date of a recurring task. The task is unchanged on error.
    pub fn edit(&mut self, edit: TaskEdit, clock: &impl Clock) -> Result<(), TaskDomainError> {
        let title = edit.title.map(normalize_title).transpose()?;
        if self.is_recurring && matches!(edit.due_date, Some(None)) {
            return Err(TaskDomainError::RecurrenceWithoutDueDate);
        }
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(due_date) = edit.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
        self.touch(clock);
        Ok(())
    }

    /// Builds the next instance of this recurring task, due at `next_due`.
    ///
    /// The instance copies the content and recurrence rule, points back at
    /// this task, and starts in the backlog.
    #[must_use]
    pub fn spawn_occurrence(&self, next_due: DateTime<Utc>, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: Some(next_due),
            priority: self.priority,
            status: TaskStatus::Backlog,
            position: 0,
            last_status_change_at: timestamp,
            snoozed_until: None,
            is_recurring: self.is_recurring,
            recurrence_rule: self.recurrence_rule.clone(),
            parent_task_id: Some(self.id),
            channel: self.channel.clone(),
            created_by: self.created_by.clone(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Moves the due date forward to the next occurrence.
    pub fn advance_due_date(&mut self, next_due: DateTime<Utc>, clock: &impl Clock) {
        self.due_date = Some(next_due);
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
