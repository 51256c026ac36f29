//! Port contracts for the task workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod directory;
pub mod notification;
pub mod repository;

pub use directory::{IdentityDirectory, IdentityDirectoryError, IdentityDirectoryResult};
pub use notification::{Notification, NotificationEmitter, NotificationError, NotificationKind};
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};

#[cfg(test)]
pub use directory::MockIdentityDirectory;
#[cfg(test)]
pub use notification::MockNotificationEmitter;
#[cfg(test)]
pub use repository::MockTaskRepository;
