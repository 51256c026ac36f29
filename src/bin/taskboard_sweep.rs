//! Runs one task workflow sweep against `PostgreSQL`.
//!
//! Usage:
//!
//! ```text
//! taskboard-sweep <sweep> <config-path>
//! ```
//!
//! The `sweep` must be `recurrence` or `staleness`. The JSON document at
//! `config-path` must deserialize into a [`SweepConfig`]:
//!
//! ```json
//! {
//!   "database_url": "postgres://taskboard@localhost/taskboard",
//!   "pool_size": 4,
//!   "workflow": {
//!     "stale_after_hours": 72,
//!     "snooze_hours": 72,
//!     "recurrence_lookahead_days": 366,
//!     "fan_out_attempts": 2
//!   }
//! }
//! ```
//!
//! `DATABASE_URL` overrides `database_url` when set. Each sweep kind takes a
//! `PostgreSQL` advisory lock first; when another process holds it the
//! binary logs and exits successfully. Logging goes to stderr and honours
//! `RUST_LOG` (default `info`).

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskboard::config::{ConfigError, SweepConfig, WorkflowConfig};
use taskboard::task::adapters::TracingNotificationEmitter;
use taskboard::task::adapters::postgres::{
    PostgresIdentityDirectory, PostgresTaskRepository, SweepLease, SweepLeaseError, TaskPgPool,
};
use taskboard::task::services::{RecurrenceRegenerator, StalenessDetector, TaskWorkflowError};
use thiserror::Error;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The lease pins one pooled connection for the whole run.
const MIN_POOL_SIZE: u32 = 2;

/// Errors that can occur while running a sweep.
#[derive(Debug, Error)]
enum SweepError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] PoolError),
    #[error(transparent)]
    Lease(#[from] SweepLeaseError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error("sweep failed: {0}")]
    Workflow(#[from] TaskWorkflowError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepKind {
    Recurrence,
    Staleness,
}

impl SweepKind {
    fn parse(arg: &str) -> Result<Self, SweepError> {
        match arg {
            "recurrence" => Ok(Self::Recurrence),
            "staleness" => Ok(Self::Staleness),
            other => Err(SweepError::InvalidArgs(format!(
                "unknown sweep '{other}'; expected recurrence or staleness"
            ))),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Recurrence => "recurrence",
            Self::Staleness => "staleness",
        }
    }

    /// Advisory lock key shared by every process running this sweep.
    const fn lock_key(self) -> i64 {
        match self {
            Self::Recurrence => 0x7461_736b_0001,
            Self::Staleness => 0x7461_736b_0002,
        }
    }
}

fn main() -> Result<(), BoxError> {
    init_tracing()?;
    let (kind, config_path) = parse_args(env::args())?;
    run(kind, &config_path).map_err(|err| {
        tracing::error!(sweep = kind.as_str(), error = %err, "sweep aborted");
        err.into()
    })
}

fn init_tracing() -> Result<(), BoxError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<(SweepKind, PathBuf), SweepError> {
    let _program = args.next();
    let kind = args
        .next()
        .ok_or_else(|| SweepError::InvalidArgs("missing sweep argument".into()))
        .and_then(|arg| SweepKind::parse(&arg))?;
    let config_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| SweepError::InvalidArgs("missing config path argument".into()))?;
    if let Some(extra) = args.next() {
        return Err(SweepError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok((kind, config_path))
}

fn run(kind: SweepKind, config_path: &Path) -> Result<(), SweepError> {
    let config = SweepConfig::load(config_path)?;
    let pool = build_pool(&config)?;

    let Some(lease) = SweepLease::try_acquire(&pool, kind.lock_key())? else {
        tracing::info!(sweep = kind.as_str(), "sweep already running elsewhere; skipping");
        return Ok(());
    };

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SweepError::RuntimeInit)?;
    let outcome = runtime.block_on(run_sweep(kind, pool, config.workflow));

    if let Err(err) = lease.release() {
        tracing::warn!(sweep = kind.as_str(), error = %err, "failed to release sweep lease");
    }
    outcome
}

fn build_pool(config: &SweepConfig) -> Result<TaskPgPool, SweepError> {
    let manager = ConnectionManager::<PgConnection>::new(config.require_database_url()?);
    Pool::builder()
        .max_size(config.pool_size.max(MIN_POOL_SIZE))
        .build(manager)
        .map_err(SweepError::Pool)
}

async fn run_sweep(
    kind: SweepKind,
    pool: TaskPgPool,
    workflow: WorkflowConfig,
) -> Result<(), SweepError> {
    let repository = Arc::new(PostgresTaskRepository::new(pool.clone()));
    let notifier = Arc::new(TracingNotificationEmitter::new());
    let clock = Arc::new(DefaultClock);

    match kind {
        SweepKind::Recurrence => {
            let report = RecurrenceRegenerator::new(repository, notifier, clock)
                .with_config(workflow)
                .run_recurrence_sweep()
                .await?;
            tracing::info!(
                sweep = kind.as_str(),
                processed = report.processed,
                errors = report.errors,
                skipped = report.skipped,
                total = report.total,
                "sweep complete"
            );
        }
        SweepKind::Staleness => {
            let directory = Arc::new(PostgresIdentityDirectory::new(pool));
            let report = StalenessDetector::new(repository, directory, notifier, clock)
                .with_config(workflow)
                .run_staleness_sweep()
                .await?;
            tracing::info!(
                sweep = kind.as_str(),
                identities = report.identities,
                notified = report.notified,
                errors = report.errors,
                "sweep complete"
            );
        }
    }
    Ok(())
}
