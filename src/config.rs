//! Runtime configuration for workflow services and the sweep binary.

use chrono::TimeDelta;
use serde::Deserialize;
use std::{env, fs, io, path::Path};
use thiserror::Error;

/// Environment variable that overrides [`SweepConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

const DEFAULT_STALE_AFTER_HOURS: u32 = 72;
const DEFAULT_SNOOZE_HOURS: u32 = 72;
const DEFAULT_RECURRENCE_LOOKAHEAD_DAYS: u32 = 366;
const DEFAULT_FAN_OUT_ATTEMPTS: u32 = 2;
const DEFAULT_POOL_SIZE: u32 = 4;

/// Tunables shared by the workflow services.
///
/// The defaults reproduce the product behaviour: tasks go stale after three
/// days, a snooze lasts three days, and recurrence rules are searched one
/// year ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Hours without a status change before a task is stale.
    pub stale_after_hours: u32,
    /// Hours a snooze suppresses staleness.
    pub snooze_hours: u32,
    /// Days past the current due date searched for the next occurrence.
    pub recurrence_lookahead_days: u32,
    /// Attempts made when fanning a status out to assignments.
    pub fan_out_attempts: u32,
}

impl WorkflowConfig {
    /// Returns the staleness threshold.
    #[must_use]
    pub fn stale_after(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.stale_after_hours))
    }

    /// Returns the snooze length.
    #[must_use]
    pub fn snooze_duration(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.snooze_hours))
    }

    /// Returns the recurrence search window.
    #[must_use]
    pub fn recurrence_lookahead(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.recurrence_lookahead_days))
    }

    /// Returns the fan-out attempt budget, never less than one.
    #[must_use]
    pub fn fan_out_attempts(&self) -> u32 {
        self.fan_out_attempts.max(1)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stale_after_hours: DEFAULT_STALE_AFTER_HOURS,
            snooze_hours: DEFAULT_SNOOZE_HOURS,
            recurrence_lookahead_days: DEFAULT_RECURRENCE_LOOKAHEAD_DAYS,
            fan_out_attempts: DEFAULT_FAN_OUT_ATTEMPTS,
        }
    }
}

/// Configuration file consumed by the `taskboard-sweep` binary.
///
/// ```json
/// {
///   "database_url": "postgres://taskboard@localhost/taskboard",
///   "pool_size": 4,
///   "workflow": { "stale_after_hours": 72 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// `PostgreSQL` connection URL.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Workflow tunables.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

const fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

/// Errors raised while loading [`SweepConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Read(#[source] io::Error),
    /// The configuration file is not valid JSON for [`SweepConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
    /// Neither the file nor the environment supplies a database URL.
    #[error("no database URL configured; set {DATABASE_URL_ENV} or database_url")]
    MissingDatabaseUrl,
}

impl SweepConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(ConfigError::Parse)
    }

    /// Loads configuration from `path`, letting `DATABASE_URL` override the
    /// file's database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let document = fs::read_to_string(path).map_err(ConfigError::Read)?;
        let mut config = Self::from_json(&document)?;
        if let Some(url) = env::var(DATABASE_URL_ENV).ok().filter(|url| !url.is_empty()) {
            config.database_url = Some(url);
        }
        Ok(config)
    }

    /// Returns the configured database URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when none is configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}
