//! Reminder tasks shared between several assignees.
//!
//! A task moves through one status lifecycle seen by its creator and by
//! each assignee. This module keeps the aggregate status and the
//! per-assignee statuses consistent, orders tasks on a Kanban board, flags
//! tasks nobody has touched for a while, and rolls recurring tasks forward.
//! It follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
