//! Taskboard: reminder assignment and workflow engine.
//!
//! The crate models reminders as units of work shared by several
//! assignees. It resolves team assignments, synchronizes per-assignee and
//! aggregate status, orders tasks on a Kanban board, detects stale work,
//! and regenerates recurring reminders.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage, users, and notifications
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`task`]: Task domain, ports, adapters, and workflow services
//! - [`config`]: Workflow tunables and sweep configuration

pub mod config;
pub mod task;
