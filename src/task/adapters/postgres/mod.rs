//! `PostgreSQL` adapters for task workflow persistence.

mod directory;
mod lease;
mod models;
mod repository;
mod schema;

pub use directory::PostgresIdentityDirectory;
pub use lease::{SweepLease, SweepLeaseError};
pub use repository::{PostgresTaskRepository, TaskPgPool};
