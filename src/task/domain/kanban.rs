//! Column ordering for Kanban moves.

use super::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Rank assigned to one task in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPlacement {
    /// Task being ranked.
    pub task_id: TaskId,
    /// Dense zero-based rank within the column.
    pub position: i64,
}

/// Computes the dense ordering of a column after inserting `moved` at
/// `requested`.
///
/// `siblings` are the other tasks currently in the target column; `moved`
/// is skipped if present. Siblings keep their relative order (position,
/// then creation time, then id). The requested rank is clamped to
/// `0..=siblings.len()`.
#[must_use]
pub fn plan_column_placements(
    siblings: &[Task],
    moved: TaskId,
    requested: i64,
) -> Vec<ColumnPlacement> {
    let mut ordered: Vec<&Task> = siblings.iter().filter(|task| task.id() != moved).collect();
    ordered.sort_by(|left, right| column_order(left, right));

    let slot = usize::try_from(requested.max(0))
        .unwrap_or(usize::MAX)
        .min(ordered.len());
    let mut ids: Vec<TaskId> = ordered.into_iter().map(Task::id).collect();
    ids.insert(slot, moved);

    ids.into_iter()
        .zip(0_i64..)
        .map(|(task_id, position)| ColumnPlacement { task_id, position })
        .collect()
}

/// Orders tasks the way the board shows them: by column, then rank, then
/// creation time. Tasks without a column sort last.
#[must_use]
pub fn board_order(left: &Task, right: &Task) -> Ordering {
    let column_rank = |task: &Task| task.status().column().map_or(u8::MAX, |column| column.rank());
    column_rank(left)
        .cmp(&column_rank(right))
        .then_with(|| column_order(left, right))
}

fn column_order(left: &Task, right: &Task) -> Ordering {
    left.position()
        .cmp(&right.position())
        .then_with(|| left.created_at().cmp(&right.created_at()))
        .then_with(|| left.id().cmp(&right.id()))
}
