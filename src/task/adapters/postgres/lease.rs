//! Cross-process exclusion for periodic sweeps.
//!
//! A lease is a session-level `PostgreSQL` advisory lock held on a
//! dedicated pooled connection. Only one holder per key exists across every
//! process sharing the database.

use super::repository::TaskPgPool;
use diesel::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PoolError, PooledConnection};
use diesel::result::Error as DieselError;
use diesel::sql_types::{BigInt, Bool};
use thiserror::Error;

type LeaseConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// Errors raised while taking or releasing a sweep lease.
#[derive(Debug, Error)]
pub enum SweepLeaseError {
    /// No connection could be checked out.
    #[error("failed to obtain a connection for the sweep lease: {0}")]
    Pool(#[from] PoolError),
    /// The advisory lock query failed.
    #[error("advisory lock query failed: {0}")]
    Query(#[from] DieselError),
}

#[derive(QueryableByName)]
struct LockOutcome {
    #[diesel(sql_type = Bool)]
    acquired: bool,
}

/// Held advisory lock. Dropping the lease releases it.
pub struct SweepLease {
    key: i64,
    connection: Option<LeaseConnection>,
}

impl std::fmt::Debug for SweepLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepLease")
            .field("key", &self.key)
            .field("held", &self.connection.is_some())
            .finish()
    }
}

impl SweepLease {
    /// Tries to take the lock for `key` without waiting.
    ///
    /// Returns `Ok(None)` when another session holds it. This call blocks
    /// the current thread on database I/O.
    ///
    /// # Errors
    ///
    /// Returns [`SweepLeaseError`] when the pool or the lock query fails.
    pub fn try_acquire(pool: &TaskPgPool, key: i64) -> Result<Option<Self>, SweepLeaseError> {
        let mut connection = pool.get()?;
        let outcome = diesel::sql_query("SELECT pg_try_advisory_lock($1) AS acquired")
            .bind::<BigInt, _>(key)
            .get_result::<LockOutcome>(&mut connection)?;
        if !outcome.acquired {
            return Ok(None);
        }
        Ok(Some(Self {
            key,
            connection: Some(connection),
        }))
    }

    /// Returns the advisory lock key.
    #[must_use]
    pub const fn key(&self) -> i64 {
        self.key
    }

    /// Releases the lock and reports whether the unlock query succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SweepLeaseError::Query`] when the unlock query fails.
    pub fn release(mut self) -> Result<(), SweepLeaseError> {
        self.unlock()
    }

    fn unlock(&mut self) -> Result<(), SweepLeaseError> {
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };
        diesel::sql_query("SELECT pg_advisory_unlock($1) AS acquired")
            .bind::<BigInt, _>(self.key)
            .get_result::<LockOutcome>(&mut connection)?;
        Ok(())
    }
}

impl Drop for SweepLease {
    fn drop(&mut self) {
        if let Err(err) = self.unlock() {
            tracing::warn!(key = self.key, error = %err, "failed to release sweep lease");
        }
    }
}
