//! Port for looking up registered users and team membership.

use crate::task::domain::{Identity, TeamName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity directory lookups.
pub type IdentityDirectoryResult<T> = Result<T, IdentityDirectoryError>;

/// Read-only view of the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Returns `true` when `identity` belongs to a registered user.
    async fn is_registered(&self, identity: &Identity) -> IdentityDirectoryResult<bool>;

    /// Returns every approved user whose team is `team`.
    async fn list_approved_by_team(&self, team: &TeamName)
    -> IdentityDirectoryResult<Vec<Identity>>;

    /// Returns every approved user.
    async fn list_approved(&self) -> IdentityDirectoryResult<Vec<Identity>>;
}

/// Errors returned by identity directory implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityDirectoryError {
    /// The directory could not be queried.
    #[error("identity directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityDirectoryError {
    /// Wraps a lookup failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
