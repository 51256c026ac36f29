//! `PostgreSQL` view of the user directory.

use super::{repository::TaskPgPool, schema::users};
use crate::task::{
    domain::{Identity, TeamName},
    ports::{IdentityDirectory, IdentityDirectoryError, IdentityDirectoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;

diesel::define_sql_function! {
    /// SQL `lower(text)`; stored addresses may carry any case.
    fn lower(value: Text) -> Text;
}

/// Reads identities from the `users` table.
#[derive(Debug, Clone)]
pub struct PostgresIdentityDirectory {
    pool: TaskPgPool,
}

impl PostgresIdentityDirectory {
    /// Creates a directory backed by `pool`.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> IdentityDirectoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> IdentityDirectoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(IdentityDirectoryError::unavailable)?;
            f(&mut connection)
        })
        .await
        .map_err(IdentityDirectoryError::unavailable)?
    }
}

#[async_trait]
impl IdentityDirectory for PostgresIdentityDirectory {
    async fn is_registered(&self, identity: &Identity) -> IdentityDirectoryResult<bool> {
        let email = identity.as_str().to_owned();
        self.run_blocking(move |connection| {
            diesel::select(diesel::dsl::exists(
                users::table.filter(lower(users::email).eq(email)),
            ))
            .get_result::<bool>(connection)
            .map_err(IdentityDirectoryError::unavailable)
        })
        .await
    }

    async fn list_approved_by_team(
        &self,
        team: &TeamName,
    ) -> IdentityDirectoryResult<Vec<Identity>> {
        let team = team.as_str().to_owned();
        self.run_blocking(move |connection| {
            let emails = users::table
                .filter(users::approved.eq(true))
                .filter(users::team.eq(team))
                .select(lower(users::email))
                .distinct()
                .order(lower(users::email).asc())
                .load::<String>(connection)
                .map_err(IdentityDirectoryError::unavailable)?;
            Ok(to_identities(emails))
        })
        .await
    }

    async fn list_approved(&self) -> IdentityDirectoryResult<Vec<Identity>> {
        self.run_blocking(move |connection| {
            let emails = users::table
                .filter(users::approved.eq(true))
                .select(lower(users::email))
                .distinct()
                .order(lower(users::email).asc())
                .load::<String>(connection)
                .map_err(IdentityDirectoryError::unavailable)?;
            Ok(to_identities(emails))
        })
        .await
    }
}

/// Converts stored e-mails, skipping rows that are not usable identities.
fn to_identities(emails: Vec<String>) -> Vec<Identity> {
    emails
        .into_iter()
        .filter_map(|email| match Identity::new(email) {
            Ok(identity) => Some(identity),
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed directory entry");
                None
            }
        })
        .collect()
}
