//! `PostgreSQL` repository implementation for tasks and assignments.

use super::{
    models::{AssignmentRow, NewTaskRow, TaskRow},
    schema::{task_assignments, tasks},
};
use crate::task::{
    domain::{
        Assignment, AssignmentStatus, ColumnPlacement, Identity, PersistedTaskData, Task, TaskId,
        TaskPriority, TaskStatus,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

const HIDDEN: &str = TaskStatus::Hidden.as_str();
const TASKS_PRIMARY_KEY: &str = "tasks_pkey";

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: &Task, assignments: &[Assignment]) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        reject_repeated_assignees(task_id, assignments)?;
        let new_row = to_new_row(task);
        let assignment_rows: Vec<AssignmentRow> =
            assignments.iter().map(to_assignment_row).collect();

        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::insert_into(tasks::table)
                    .values(&new_row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                            if is_constraint(info.as_ref(), TASKS_PRIMARY_KEY) =>
                        {
                            TaskRepositoryError::DuplicateTask(task_id)
                        }
                        _ => TaskRepositoryError::persistence(err),
                    })?;
                if !assignment_rows.is_empty() {
                    diesel::insert_into(task_assignments::table)
                        .values(&assignment_rows)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_new_row(task);

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)?;
            if updated_count == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_visible_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        let email = identity.as_str().to_owned();
        self.run_blocking(move |connection| {
            let active_assignments = task_assignments::table
                .filter(task_assignments::assignee.eq(email.clone()))
                .filter(task_assignments::status.ne(HIDDEN))
                .select(task_assignments::task_id);
            let rows = tasks::table
                .filter(tasks::status.ne(HIDDEN))
                .filter(
                    tasks::created_by
                        .eq(email)
                        .or(tasks::id.eq_any(active_assignments)),
                )
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_assigned_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        let email = identity.as_str().to_owned();
        self.run_blocking(move |connection| {
            let active_assignments = task_assignments::table
                .filter(task_assignments::assignee.eq(email))
                .filter(task_assignments::status.ne(HIDDEN))
                .select(task_assignments::task_id);
            let rows = tasks::table
                .filter(tasks::status.ne(HIDDEN))
                .filter(tasks::id.eq_any(active_assignments))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_due_recurring(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::is_recurring.eq(true))
                .filter(tasks::parent_task_id.is_null())
                .filter(tasks::status.ne(HIDDEN))
                .filter(tasks::due_date.lt(now))
                .order(tasks::due_date.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn update_positions(
        &self,
        placements: &[ColumnPlacement],
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let placements = placements.to_vec();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                for placement in &placements {
                    let updated_count =
                        diesel::update(tasks::table.find(placement.task_id.into_inner()))
                            .set((
                                tasks::position.eq(placement.position),
                                tasks::updated_at.eq(at),
                            ))
                            .execute(tx)?;
                    if updated_count == 0 {
                        return Err(TaskRepositoryError::NotFound(placement.task_id));
                    }
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_assignments(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Assignment>> {
        self.run_blocking(move |connection| {
            let rows = task_assignments::table
                .filter(task_assignments::task_id.eq(task_id.into_inner()))
                .order(task_assignments::assignee.asc())
                .select(AssignmentRow::as_select())
                .load::<AssignmentRow>(connection)?;
            rows.into_iter().map(row_to_assignment).collect()
        })
        .await
    }

    async fn find_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<Option<Assignment>> {
        let email = assignee.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = task_assignments::table
                .find((task_id.into_inner(), email))
                .select(AssignmentRow::as_select())
                .first::<AssignmentRow>(connection)
                .optional()?;
            row.map(row_to_assignment).transpose()
        })
        .await
    }

    async fn add_assignment(&self, assignment: &Assignment) -> TaskRepositoryResult<()> {
        let task_id = assignment.task_id();
        let assignee = assignment.assignee().clone();
        let row = to_assignment_row(assignment);

        self.run_blocking(move |connection| {
            diesel::insert_into(task_assignments::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateAssignment {
                            task_id,
                            assignee: assignee.clone(),
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        TaskRepositoryError::NotFound(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn remove_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<()> {
        let assignee = assignee.clone();
        self.run_blocking(move |connection| {
            let deleted_count = diesel::delete(
                task_assignments::table.find((task_id.into_inner(), assignee.as_str())),
            )
            .execute(connection)?;
            if deleted_count == 0 {
                return Err(TaskRepositoryError::AssignmentNotFound { task_id, assignee });
            }
            Ok(())
        })
        .await
    }

    async fn set_assignment_status(
        &self,
        task_id: TaskId,
        assignee: &Identity,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let assignee = assignee.clone();
        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                task_assignments::table.find((task_id.into_inner(), assignee.as_str())),
            )
            .set((
                task_assignments::status.eq(status.as_str()),
                task_assignments::updated_at.eq(at),
            ))
            .execute(connection)?;
            if updated_count == 0 {
                return Err(TaskRepositoryError::AssignmentNotFound { task_id, assignee });
            }
            Ok(())
        })
        .await
    }

    async fn set_all_assignment_statuses(
        &self,
        task_id: TaskId,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize> {
        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                task_assignments::table.filter(task_assignments::task_id.eq(task_id.into_inner())),
            )
            .set((
                task_assignments::status.eq(status.as_str()),
                task_assignments::updated_at.eq(at),
            ))
            .execute(connection)?;
            Ok(updated_count)
        })
        .await
    }
}

fn reject_repeated_assignees(
    task_id: TaskId,
    assignments: &[Assignment],
) -> TaskRepositoryResult<()> {
    let mut seen = HashSet::new();
    for assignment in assignments {
        if !seen.insert(assignment.assignee()) {
            return Err(TaskRepositoryError::DuplicateAssignment {
                task_id,
                assignee: assignment.assignee().clone(),
            });
        }
    }
    Ok(())
}

fn to_new_row(task: &Task) -> NewTaskRow {
    NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().map(str::to_owned),
        due_date: task.due_date(),
        priority: task.priority().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        position: task.position(),
        last_status_change_at: task.last_status_change_at(),
        snoozed_until: task.snoozed_until(),
        is_recurring: task.is_recurring(),
        recurrence_rule: task.recurrence_rule().map(str::to_owned),
        parent_task_id: task.parent_task_id().map(TaskId::into_inner),
        channel: task.channel().map(str::to_owned),
        created_by: task.created_by().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        due_date,
        priority: persisted_priority,
        status: persisted_status,
        position,
        last_status_change_at,
        snoozed_until,
        is_recurring,
        recurrence_rule,
        parent_task_id,
        channel,
        created_by: persisted_creator,
        created_at,
        updated_at,
    } = row;

    let priority = TaskPriority::try_from(persisted_priority.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let status =
        TaskStatus::try_from(persisted_status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let created_by = Identity::new(persisted_creator).map_err(TaskRepositoryError::persistence)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        due_date,
        priority,
        status,
        position,
        last_status_change_at,
        snoozed_until,
        is_recurring,
        recurrence_rule,
        parent_task_id: parent_task_id.map(TaskId::from_uuid),
        channel,
        created_by,
        created_at,
        updated_at,
    }))
}

fn to_assignment_row(assignment: &Assignment) -> AssignmentRow {
    AssignmentRow {
        task_id: assignment.task_id().into_inner(),
        assignee: assignment.assignee().as_str().to_owned(),
        status: assignment.status().as_str().to_owned(),
        updated_at: assignment.updated_at(),
    }
}

fn row_to_assignment(row: AssignmentRow) -> TaskRepositoryResult<Assignment> {
    let assignee = Identity::new(row.assignee).map_err(TaskRepositoryError::persistence)?;
    let status = AssignmentStatus::try_from(row.status.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    Ok(Assignment::from_persisted(
        TaskId::from_uuid(row.task_id),
        assignee,
        status,
        row.updated_at,
    ))
}

fn is_constraint(info: &dyn DatabaseErrorInformation, constraint: &str) -> bool {
    info.constraint_name().is_some_and(|name| name == constraint)
}
