//! Domain model for reminder tasks and their assignments.
//!
//! The task domain models multi-assignee reminders, their shared status
//! lifecycle, board ordering, staleness, and recurrence while keeping all
//! infrastructure concerns outside of the domain boundary.

mod assignment;
mod error;
mod ids;
mod kanban;
mod priority;
mod recurrence;
mod status;
mod task;

pub use assignment::Assignment;
pub use error::{ParsePriorityError, ParseTaskStatusError, RecurrenceRuleError, TaskDomainError};
pub use ids::{AssigneeTarget, Identity, TEAM_TAG_PREFIX, TaskId, TeamName};
pub use kanban::{ColumnPlacement, board_order, plan_column_placements};
pub use priority::TaskPriority;
pub use recurrence::{Frequency, RecurrenceRule, calculate_next_occurrence, is_usable_rule};
pub use status::{AssignmentStatus, KanbanColumn, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft, TaskEdit};
