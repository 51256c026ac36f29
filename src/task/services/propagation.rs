//! Creator-driven status fan-out to assignments.

use crate::task::{
    domain::{AssignmentStatus, TaskId},
    ports::{TaskRepository, TaskRepositoryResult},
};
use chrono::{DateTime, Utc};

/// Writes `status` onto every assignment of a task in one bulk update.
///
/// The update is retried up to `attempts` times in total; the last failure
/// is returned. The bulk write is idempotent.
pub(super) async fn fan_out_status<R>(
    repository: &R,
    task_id: TaskId,
    status: AssignmentStatus,
    at: DateTime<Utc>,
    attempts: u32,
) -> TaskRepositoryResult<usize>
where
    R: TaskRepository + ?Sized,
{
    let mut attempt = 1;
    loop {
        match repository
            .set_all_assignment_statuses(task_id, status, at)
            .await
        {
            Ok(changed) => return Ok(changed),
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    task_id = %task_id,
                    attempt,
                    error = %err,
                    "assignment fan-out failed, retrying"
                );
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
