//! Shared test helpers for in-memory workflow integration tests.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use taskboard::{
    config::WorkflowConfig,
    task::{
        adapters::memory::{
            InMemoryIdentityDirectory, InMemoryTaskRepository, RecordingNotificationEmitter,
        },
        domain::{Identity, Task, TeamName},
        services::{CreateTaskRequest, RecurrenceRegenerator, TaskService},
    },
};

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub struct SteppedClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppedClock {
    /// Creates a clock stopped at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Service type exercised by the integration tests.
pub type Service = TaskService<
    InMemoryTaskRepository,
    InMemoryIdentityDirectory,
    RecordingNotificationEmitter,
    SteppedClock,
>;

/// Recurrence regenerator sharing the workspace adapters.
pub type Regenerator =
    RecurrenceRegenerator<InMemoryTaskRepository, RecordingNotificationEmitter, SteppedClock>;

/// A task service and handles on the adapters behind it.
pub struct Workspace {
    pub service: Service,
    pub regenerator: Regenerator,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub notifier: Arc<RecordingNotificationEmitter>,
    pub clock: Arc<SteppedClock>,
}

/// Parses an address known to be valid.
///
/// # Panics
///
/// Panics if `address` is not a valid identity.
pub fn who(address: &str) -> Identity {
    Identity::new(address).expect("valid identity")
}

/// Builds a UTC timestamp on the hour.
///
/// # Panics
///
/// Panics if the date does not exist.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn team(name: &str) -> Option<TeamName> {
    Some(TeamName::new(name).expect("valid team name"))
}

/// Provides a workspace whose directory holds:
///
/// - `alice@x.com` and `bob@x.com`, approved, no team
/// - `carol@x.com` and `frank@x.com`, approved, team `AI`
/// - `dave@x.com`, registered but not approved, team `AI`
#[fixture]
pub fn workspace() -> Workspace {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let directory = Arc::new(
        InMemoryIdentityDirectory::new()
            .with_user(who("alice@x.com"), None, true)
            .with_user(who("bob@x.com"), None, true)
            .with_user(who("carol@x.com"), team("AI"), true)
            .with_user(who("frank@x.com"), team("AI"), true)
            .with_user(who("dave@x.com"), team("AI"), false),
    );
    let notifier = Arc::new(RecordingNotificationEmitter::new());
    let clock = Arc::new(SteppedClock::new(at(2026, 6, 1, 8)));
    let config = WorkflowConfig::default();
    let service = TaskService::new(
        Arc::clone(&repository),
        Arc::clone(&directory),
        Arc::clone(&notifier),
        Arc::clone(&clock),
    )
    .with_config(config);
    let regenerator = RecurrenceRegenerator::new(
        Arc::clone(&repository),
        Arc::clone(&notifier),
        Arc::clone(&clock),
    )
    .with_config(config);
    Workspace {
        service,
        regenerator,
        directory,
        notifier,
        clock,
    }
}

impl Workspace {
    /// Creates a task through the service.
    ///
    /// # Errors
    ///
    /// Returns an error if task creation fails.
    pub async fn create(
        &self,
        creator: &str,
        title: &str,
        assignees: &[&str],
    ) -> Result<Task, eyre::Report> {
        let request = CreateTaskRequest::new(who(creator), title)
            .with_assignees(assignees.iter().map(|entry| (*entry).to_owned()));
        Ok(self.service.create_task(request).await?)
    }

    /// Returns the recipients of every recorded notification, in order.
    pub fn recipients(&self) -> Vec<String> {
        self.notifier
            .sent()
            .iter()
            .map(|notification| notification.recipient.to_string())
            .collect()
    }
}
