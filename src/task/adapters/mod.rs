//! Adapter implementations for task workflow ports.

pub mod memory;
pub mod postgres;

mod tracing_notifier;

pub use tracing_notifier::TracingNotificationEmitter;
