//! Port for requesting user notifications.
//!
//! Delivery is owned by the implementation. Workflow services treat every
//! request as fire-and-forget: a failed notification never fails the task
//! mutation that caused it.

use crate::task::domain::{Identity, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Reason a notification is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// The recipient was assigned to a task.
    TaskAssigned,
    /// Someone else changed the status of the recipient's task.
    TaskStatusChanged,
    /// The recipient's task has gone stale.
    TaskStale,
    /// A recurring task produced a new occurrence.
    TaskRecurred,
}

impl NotificationKind {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssigned => "task_assigned",
            Self::TaskStatusChanged => "task_status_changed",
            Self::TaskStale => "task_stale",
            Self::TaskRecurred => "task_recurred",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notification request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Who should be told.
    pub recipient: Identity,
    /// Why they are being told.
    pub kind: NotificationKind,
    /// Kind-specific details for rendering.
    pub payload: Value,
}

impl Notification {
    /// Builds a notification about `task` with the standard task payload.
    #[must_use]
    pub fn about_task(recipient: Identity, kind: NotificationKind, task: &Task) -> Self {
        Self {
            recipient,
            kind,
            payload: json!({
                "task_id": task.id(),
                "title": task.title(),
                "status": task.status(),
                "priority": task.priority(),
                "due_date": task.due_date(),
            }),
        }
    }

    /// Adds the acting identity to the payload.
    #[must_use]
    pub fn with_actor(mut self, actor: &Identity) -> Self {
        if let Value::Object(ref mut fields) = self.payload {
            fields.insert("actor".to_owned(), Value::String(actor.to_string()));
        }
        self
    }
}

/// Sink for notification requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    /// Requests delivery of a notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationError`] when the request could not be accepted.
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Errors returned by notification emitters.
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    /// The notification could not be handed off.
    #[error("notification rejected: {0}")]
    Rejected(Arc<dyn std::error::Error + Send + Sync>),
}

impl NotificationError {
    /// Wraps a delivery failure.
    pub fn rejected(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Rejected(Arc::new(err))
    }
}
