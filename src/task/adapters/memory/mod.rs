//! In-memory adapters for task workflow ports.

mod directory;
mod notification;
mod task;

pub use directory::InMemoryIdentityDirectory;
pub use notification::RecordingNotificationEmitter;
pub use task::InMemoryTaskRepository;
