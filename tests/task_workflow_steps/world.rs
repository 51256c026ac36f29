//! Shared world state for task workflow BDD scenarios.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use taskboard::task::{
    adapters::memory::{
        InMemoryIdentityDirectory, InMemoryTaskRepository, RecordingNotificationEmitter,
    },
    domain::{Identity, Task},
    services::{TaskService, TaskWorkflowError},
};

/// Clock advanced explicitly by scenario steps.
#[derive(Debug)]
pub struct ScenarioClock {
    now: Mutex<DateTime<Utc>>,
}

impl ScenarioClock {
    fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ScenarioClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Service type used by the BDD world.
pub type ScenarioService = TaskService<
    InMemoryTaskRepository,
    InMemoryIdentityDirectory,
    RecordingNotificationEmitter,
    ScenarioClock,
>;

/// Scenario world for task workflow behaviour tests.
pub struct TaskWorkflowWorld {
    pub service: ScenarioService,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub clock: Arc<ScenarioClock>,
    pub current_task: Option<Task>,
    pub last_create_result: Option<Result<Task, TaskWorkflowError>>,
}

impl TaskWorkflowWorld {
    /// Creates a world where `alice@x.com` and `bob@x.com` are approved
    /// users without a team.
    #[must_use]
    pub fn new() -> Self {
        let directory = Arc::new(InMemoryIdentityDirectory::new());
        for address in ["alice@x.com", "bob@x.com"] {
            if let Ok(identity) = Identity::new(address) {
                directory.register(identity, None, true);
            }
        }
        let start = Utc
            .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        let clock = Arc::new(ScenarioClock::starting_at(start));
        let service = TaskService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::clone(&directory),
            Arc::new(RecordingNotificationEmitter::new()),
            Arc::clone(&clock),
        );

        Self {
            service,
            directory,
            clock,
            current_task: None,
            last_create_result: None,
        }
    }

    /// Returns the task the scenario is working on.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.current_task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
    }
}

impl Default for TaskWorkflowWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskWorkflowWorld {
    TaskWorkflowWorld::default()
}

/// Parses a scenario address.
///
/// # Errors
///
/// Returns an error when `address` is not a valid identity.
pub fn identity(address: &str) -> Result<Identity, eyre::Report> {
    Identity::new(address).map_err(|err| eyre::eyre!("invalid identity in scenario: {err}"))
}

/// Splits a comma-separated scenario list.
pub fn entries(list: &str) -> Vec<String> {
    list.split(',').map(|entry| entry.trim().to_owned()).collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
