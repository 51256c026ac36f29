//! In-memory user directory.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Identity, TeamName},
    ports::{IdentityDirectory, IdentityDirectoryError, IdentityDirectoryResult},
};

#[derive(Debug, Clone)]
struct DirectoryEntry {
    team: Option<TeamName>,
    approved: bool,
}

/// Thread-safe in-memory identity directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityDirectory {
    users: Arc<RwLock<BTreeMap<Identity, DirectoryEntry>>>,
}

impl InMemoryIdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the directory with one more user registered.
    #[must_use]
    pub fn with_user(self, identity: Identity, team: Option<TeamName>, approved: bool) -> Self {
        self.register(identity, team, approved);
        self
    }

    /// Registers or replaces a user.
    pub fn register(&self, identity: Identity, team: Option<TeamName>, approved: bool) {
        let mut users = match self.users.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        users.insert(identity, DirectoryEntry { team, approved });
    }

    fn select(
        &self,
        include: impl Fn(&DirectoryEntry) -> bool,
    ) -> IdentityDirectoryResult<Vec<Identity>> {
        let users = self.users.read().map_err(|err| {
            IdentityDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(users
            .iter()
            .filter(|(_, entry)| entry.approved && include(entry))
            .map(|(identity, _)| identity.clone())
            .collect())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn is_registered(&self, identity: &Identity) -> IdentityDirectoryResult<bool> {
        let users = self.users.read().map_err(|err| {
            IdentityDirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(users.contains_key(identity))
    }

    async fn list_approved_by_team(
        &self,
        team: &TeamName,
    ) -> IdentityDirectoryResult<Vec<Identity>> {
        self.select(|entry| entry.team.as_ref() == Some(team))
    }

    async fn list_approved(&self) -> IdentityDirectoryResult<Vec<Identity>> {
        self.select(|_| true)
    }
}
