//! Shared test helpers for `PostgreSQL` adapter integration tests.
//!
//! Each test gets its own database cloned from a migrated template on the
//! shared embedded cluster. When the cluster cannot start (no network to
//! fetch binaries, or a root run without `PG_EMBEDDED_WORKER`), the fixture
//! yields `None` and the tests return early.

use std::future::Future;
use std::sync::OnceLock;

use chrono::{DateTime, Local, TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{Bool, Nullable, Text};
use mockable::Clock;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use pg_embedded_setup_unpriv::{BootstrapResult, ClusterHandle, TemporaryDatabase};
use rstest::fixture;
use taskboard::task::{
    adapters::postgres::{PostgresIdentityDirectory, PostgresTaskRepository, TaskPgPool},
    domain::{Assignment, Identity, Task, TaskDraft},
};
use tokio::runtime::Runtime;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Schema applied to the template database.
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2026-01-12-000000_create_tasks/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "taskboard_test_template";

/// Clock pinned to one instant, with whole-second precision so values
/// survive a `timestamptz` round trip unchanged.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a clock stopped at `now`.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
    }
}

/// Per-test database with adapters wired to it.
pub struct PgContext {
    pub runtime: Runtime,
    pub pool: TaskPgPool,
    pub repository: PostgresTaskRepository,
    pub directory: PostgresIdentityDirectory,
    pub clock: FixedClock,
    database: Option<TemporaryDatabase>,
}

impl PgContext {
    fn new(cluster: &'static ClusterHandle) -> Result<Self, BoxError> {
        cluster.ensure_template_exists(TEMPLATE_DB, |name| {
            apply_migrations(&cluster.connection().database_url(name))
        })?;
        let name = format!("taskboard_{}", Uuid::new_v4().simple());
        let database = cluster.temporary_database_from_template(name, TEMPLATE_DB)?;
        let pool = pool_for(database.url())?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            repository: PostgresTaskRepository::new(pool.clone()),
            directory: PostgresIdentityDirectory::new(pool.clone()),
            pool,
            clock: FixedClock::new(at(2026, 3, 2, 9)),
            database: Some(database),
        })
    }

    /// Runs an adapter call to completion.
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Opens a second pool on the same database, for tests that need an
    /// independent session.
    pub fn second_pool(&self) -> Result<TaskPgPool, BoxError> {
        let url = self
            .database
            .as_ref()
            .map(|database| database.url().to_owned())
            .ok_or("database already dropped")?;
        pool_for(&url)
    }

    /// Inserts a row into the `users` table as stored, without normalising.
    pub fn insert_user(
        &self,
        email: &str,
        team: Option<&str>,
        approved: bool,
    ) -> Result<(), BoxError> {
        let mut connection = self.pool.get()?;
        diesel::sql_query("INSERT INTO users (email, team, approved) VALUES ($1, $2, $3)")
            .bind::<Text, _>(email)
            .bind::<Nullable<Text>, _>(team)
            .bind::<Bool, _>(approved)
            .execute(&mut connection)?;
        Ok(())
    }

    /// Builds a task created by `creator`, timestamped by the context clock.
    ///
    /// # Panics
    ///
    /// Panics if `title` is blank.
    pub fn task(&self, title: &str, creator: &str) -> Task {
        self.task_from(TaskDraft::new(title).expect("valid title"), creator)
    }

    /// Builds a task from a prepared draft.
    ///
    /// # Panics
    ///
    /// Panics if the draft is not a valid task.
    pub fn task_from(&self, draft: TaskDraft, creator: &str) -> Task {
        Task::new(draft, who(creator), &self.clock).expect("valid task")
    }

    /// Builds backlog assignments of `task` for each address.
    pub fn assignments(&self, task: &Task, assignees: &[&str]) -> Vec<Assignment> {
        assignees
            .iter()
            .map(|address| Assignment::new(task.id(), who(address), &self.clock))
            .collect()
    }
}

impl Drop for PgContext {
    fn drop(&mut self) {
        if let Some(database) = self.database.take() {
            // Pooled sessions are still open; terminate them with the drop.
            drop(database.force_drop());
        }
    }
}

/// Provides a fresh migrated database, or `None` when no cluster is available.
///
/// # Panics
///
/// Panics if the cluster is up but the per-test database cannot be prepared.
#[fixture]
pub fn pg_context() -> Option<PgContext> {
    let cluster = cluster()?;
    Some(PgContext::new(cluster).expect("test database setup"))
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

#[expect(
    clippy::print_stderr,
    reason = "Skipped suites are reported on the test output"
)]
fn cluster() -> Option<&'static ClusterHandle> {
    static CLUSTER: OnceLock<Option<&'static ClusterHandle>> = OnceLock::new();
    *CLUSTER.get_or_init(|| match std::panic::catch_unwind(shared_cluster_handle) {
        Ok(Ok(handle)) => Some(handle),
        Ok(Err(err)) => {
            eprintln!("SKIP-TEST-CLUSTER: PostgreSQL unavailable: {err}");
            None
        }
        Err(_) => {
            eprintln!("SKIP-TEST-CLUSTER: PostgreSQL bootstrap panicked");
            None
        }
    })
}

fn apply_migrations(url: &str) -> BootstrapResult<()> {
    let mut connection = PgConnection::establish(url).map_err(|err| eyre::eyre!("{err}"))?;
    connection
        .batch_execute(CREATE_TASKS_SQL)
        .map_err(|err| eyre::eyre!("migration failed: {err}"))?;
    Ok(())
}

fn pool_for(url: &str) -> Result<TaskPgPool, BoxError> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    Ok(Pool::builder().max_size(2).build(manager)?)
}
