//! Notification emitter that keeps every request in memory.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::task::ports::{Notification, NotificationEmitter, NotificationError};

/// Records notifications instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationEmitter {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotificationEmitter {
    /// Creates an emitter with no recorded notifications.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every notification recorded so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forgets every recorded notification.
    pub fn clear(&self) {
        match self.sent.lock() {
            Ok(mut sent) => sent.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

#[async_trait]
impl NotificationEmitter for RecordingNotificationEmitter {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let mut sent = self.sent.lock().map_err(|err| {
            NotificationError::rejected(std::io::Error::other(err.to_string()))
        })?;
        sent.push(notification.clone());
        Ok(())
    }
}
