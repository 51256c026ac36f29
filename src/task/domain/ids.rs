//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix marking a symbolic team reference in an assignee list.
pub const TEAM_TAG_PREFIX: &str = "team:";

/// Unique identifier for a task (reminder) record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized, e-mail shaped identity of a user.
///
/// Identities are trimmed and lower-cased on construction so that two
/// spellings of the same address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Creates a validated identity from an address.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidIdentity`] when the value is not a
    /// plausible `local@domain.tld` address.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_lowercase();
        if !is_plausible_address(&normalized) {
            return Err(TaskDomainError::InvalidIdentity(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the identity as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_plausible_address(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
        && !value.chars().any(char::is_whitespace)
}

impl TryFrom<String> for Identity {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a team that can be referenced with a `team:<NAME>` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamName(String);

impl TeamName {
    /// Creates a validated team name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTeamTag`] when the name is empty
    /// after trimming or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidTeamTag(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the team name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of an assignee list: a person or a whole team.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssigneeTarget {
    /// A single user identity.
    Individual(Identity),
    /// Every approved member of a team, resolved at assignment time.
    Team(TeamName),
}

impl AssigneeTarget {
    /// Parses a raw assignee entry.
    ///
    /// Entries starting with `team:` (case-insensitive) are team tags; all
    /// other entries must be valid identities.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTeamTag`] for an empty team tag and
    /// [`TaskDomainError::InvalidIdentity`] for a malformed address.
    pub fn parse(raw: &str) -> Result<Self, TaskDomainError> {
        let trimmed = raw.trim();
        let prefix_len = TEAM_TAG_PREFIX.len();
        let is_team_tag = trimmed
            .get(..prefix_len)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TEAM_TAG_PREFIX));
        if is_team_tag {
            let name = trimmed.get(prefix_len..).unwrap_or_default();
            return TeamName::new(name)
                .map(Self::Team)
                .map_err(|_| TaskDomainError::InvalidTeamTag(raw.to_owned()));
        }
        Identity::new(trimmed).map(Self::Individual)
    }
}

impl fmt::Display for AssigneeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual(identity) => write!(f, "{identity}"),
            Self::Team(team) => write!(f, "{TEAM_TAG_PREFIX}{team}"),
        }
    }
}
