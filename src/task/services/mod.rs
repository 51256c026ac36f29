//! Application services for the task workflow.

mod access;
mod error;
mod expander;
mod kanban;
mod notify;
mod propagation;
mod recurrence;
mod staleness;
mod synchronizer;
mod tasks;

pub use error::{
    AssigneeRejection, DependencyFailure, ErrorKind, ForbiddenReason, RejectedAssignee,
    TaskValidationError, TaskWorkflowError, TaskWorkflowResult,
};
pub use expander::AssignmentExpander;
pub use kanban::KanbanPositioner;
pub use recurrence::{RecurrenceRegenerator, RecurrenceSweepReport};
pub use staleness::{StalenessDetector, StalenessSweepReport, is_stale_task};
pub use synchronizer::StatusSynchronizer;
pub use tasks::{CreateTaskRequest, TaskDetails, TaskService, UpdateTaskRequest};
