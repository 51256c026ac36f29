//! Shared fixtures for task workflow unit tests.

use std::sync::{Arc, Mutex, PoisonError};

use crate::task::{
    adapters::memory::{
        InMemoryIdentityDirectory, InMemoryTaskRepository, RecordingNotificationEmitter,
    },
    domain::{Identity, Task, TeamName},
    services::{CreateTaskRequest, RecurrenceRegenerator, TaskService},
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds a UTC timestamp on the hour.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn identity(address: &str) -> Identity {
    Identity::new(address).expect("valid identity")
}

pub fn team(name: &str) -> TeamName {
    TeamName::new(name).expect("valid team name")
}

pub const ALICE: &str = "alice@x.com";
pub const BOB: &str = "bob@x.com";
pub const CAROL: &str = "carol@x.com";
pub const DAVE: &str = "dave@x.com";
pub const ERIN: &str = "erin@x.com";

pub type TestService = TaskService<
    InMemoryTaskRepository,
    InMemoryIdentityDirectory,
    RecordingNotificationEmitter,
    ManualClock,
>;

/// A task service wired to in-memory adapters, with handles on each.
pub struct Harness {
    pub service: TestService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub directory: Arc<InMemoryIdentityDirectory>,
    pub notifier: Arc<RecordingNotificationEmitter>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    /// Builds a harness whose directory holds:
    ///
    /// - alice and bob, approved, no team
    /// - carol, approved, team `AI`
    /// - dave, registered but not approved, team `AI`
    /// - erin, approved, team `Ops`
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let directory = Arc::new(
            InMemoryIdentityDirectory::new()
                .with_user(identity(ALICE), None, true)
                .with_user(identity(BOB), None, true)
                .with_user(identity(CAROL), Some(team("AI")), true)
                .with_user(identity(DAVE), Some(team("AI")), false)
                .with_user(identity(ERIN), Some(team("Ops")), true),
        );
        let notifier = Arc::new(RecordingNotificationEmitter::new());
        let clock = Arc::new(ManualClock::new(at(2026, 3, 2, 9)));
        let service = TaskService::new(
            Arc::clone(&repository),
            Arc::clone(&directory),
            Arc::clone(&notifier),
            Arc::clone(&clock),
        );
        Self {
            service,
            repository,
            directory,
            notifier,
            clock,
        }
    }

    pub fn regenerator(
        &self,
    ) -> RecurrenceRegenerator<InMemoryTaskRepository, RecordingNotificationEmitter, ManualClock>
    {
        RecurrenceRegenerator::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
        )
    }

    /// Creates a task owned by `creator` with the given assignee entries.
    pub async fn create(&self, creator: &str, title: &str, assignees: &[&str]) -> Task {
        let request = CreateTaskRequest::new(identity(creator), title)
            .with_assignees(assignees.iter().map(|entry| (*entry).to_owned()));
        self.service
            .create_task(request)
            .await
            .expect("task creation should succeed")
    }
}

#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}
