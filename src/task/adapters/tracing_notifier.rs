//! Notification emitter that writes requests to the tracing pipeline.

use async_trait::async_trait;

use crate::task::ports::{Notification, NotificationEmitter, NotificationError};

/// Emits each notification as a structured `info` event.
///
/// Used where no delivery channel is wired, such as the sweep binary. A log
/// collector downstream can pick the events up by their `notification`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationEmitter;

impl TracingNotificationEmitter {
    /// Creates the emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationEmitter for TracingNotificationEmitter {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        tracing::info!(
            target: "notification",
            recipient = %notification.recipient,
            kind = %notification.kind,
            payload = %notification.payload,
            "notification requested"
        );
        Ok(())
    }
}
