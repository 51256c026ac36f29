//! Authorizing entry point for task CRUD and workflow operations.

use super::{
    access::Participation,
    error::{AssigneeRejection, RejectedAssignee, TaskValidationError, TaskWorkflowResult},
    expander::AssignmentExpander,
    kanban::KanbanPositioner,
    notify::emit_to_others,
    staleness::StalenessDetector,
    synchronizer::StatusSynchronizer,
};
use crate::config::WorkflowConfig;
use crate::task::{
    domain::{
        AssigneeTarget, Assignment, Identity, Task, TaskDraft, TaskEdit, TaskId, TaskPriority,
        board_order,
    },
    ports::{IdentityDirectory, NotificationEmitter, NotificationKind, TaskRepository},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    creator: Identity,
    title: String,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    priority: TaskPriority,
    recurrence_rule: Option<String>,
    channel: Option<String>,
    assignees: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(creator: Identity, title: impl Into<String>) -> Self {
        Self {
            creator,
            title: title.into(),
            description: None,
            due_date: None,
            priority: TaskPriority::default(),
            recurrence_rule: None,
            channel: None,
            assignees: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Makes the task recurring under `rule`.
    #[must_use]
    pub fn with_recurrence(mut self, rule: impl Into<String>) -> Self {
        self.recurrence_rule = Some(rule.into());
        self
    }

    /// Sets the source channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    /// Sets the assignee entries: addresses or `team:<NAME>` tags.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = String>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    fn into_draft(self) -> Result<(Identity, TaskDraft, Vec<String>), TaskValidationError> {
        let mut draft = TaskDraft::new(self.title)?.with_priority(self.priority);
        if let Some(description) = self.description {
            draft = draft.with_description(description);
        }
        if let Some(due_date) = self.due_date {
            draft = draft.with_due_date(due_date);
        }
        if let Some(rule) = self.recurrence_rule {
            draft = draft.with_recurrence(rule);
        }
        if let Some(channel) = self.channel {
            draft = draft.with_channel(channel);
        }
        Ok((self.creator, draft, self.assignees))
    }
}

/// Request payload for editing a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    edit: TaskEdit,
    assignees: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    /// Creates a request that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.edit.title = Some(title.into());
        self
    }

    /// Replaces the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.edit.description = Some(Some(description.into()));
        self
    }

    /// Removes the description.
    #[must_use]
    pub fn clear_description(mut self) -> Self {
        self.edit.description = Some(None);
        self
    }

    /// Replaces the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.edit.due_date = Some(Some(due_date));
        self
    }

    /// Removes the due date.
    #[must_use]
    pub const fn clear_due_date(mut self) -> Self {
        self.edit.due_date = Some(None);
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.edit.priority = Some(priority);
        self
    }

    /// Replaces the assignee list.
    ///
    /// Kept assignees keep their progress, new ones start in the backlog,
    /// and dropped ones lose their assignment.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = String>) -> Self {
        self.assignees = Some(assignees.into_iter().collect());
        self
    }
}

/// A task with all of its assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetails {
    /// The task.
    pub task: Task,
    /// Every assignment, ordered by assignee.
    pub assignments: Vec<Assignment>,
}

/// Task workflow facade.
///
/// Owns the authorization rules for creating, reading, editing, and
/// deleting tasks, and routes status, board, and staleness operations to
/// the component that implements them.
#[derive(Clone)]
pub struct TaskService<R, D, N, C>
where
    R: TaskRepository,
    D: IdentityDirectory,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<C>,
    expander: AssignmentExpander<D>,
    synchronizer: StatusSynchronizer<R, N, C>,
    positioner: KanbanPositioner<R, C>,
    staleness: StalenessDetector<R, D, N, C>,
}

impl<R, D, N, C> TaskService<R, D, N, C>
where
    R: TaskRepository,
    D: IdentityDirectory,
    N: NotificationEmitter,
    C: Clock + Send + Sync,
{
    /// Creates a task service with default tunables.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            expander: AssignmentExpander::new(Arc::clone(&directory)),
            synchronizer: StatusSynchronizer::new(
                Arc::clone(&repository),
                Arc::clone(&notifier),
                Arc::clone(&clock),
            ),
            positioner: KanbanPositioner::new(Arc::clone(&repository), Arc::clone(&clock)),
            staleness: StalenessDetector::new(
                Arc::clone(&repository),
                Arc::clone(&directory),
                Arc::clone(&notifier),
                Arc::clone(&clock),
            ),
            repository,
            directory,
            notifier,
            clock,
        }
    }

    /// Replaces the workflow tunables of every component.
    #[must_use]
    pub fn with_config(mut self, config: WorkflowConfig) -> Self {
        self.synchronizer = self.synchronizer.with_config(config);
        self.positioner = self.positioner.with_config(config);
        self.staleness = self.staleness.with_config(config);
        self
    }

    /// Returns the staleness detector, which also runs the staleness sweep.
    #[must_use]
    pub const fn staleness(&self) -> &StalenessDetector<R, D, N, C> {
        &self.staleness
    }

    /// Creates a task and its assignments.
    ///
    /// An empty assignee list, or one that expands to nobody, assigns the
    /// creator. Every assignee other than the creator is notified.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title, an unusable recurrence
    /// setup, or any malformed or unregistered assignee (all offenders are
    /// listed). Returns a dependency error when the directory or repository
    /// fails. Nothing is stored on error.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskWorkflowResult<Task> {
        let (creator, draft, entries) = request.into_draft()?;
        let task = Task::new(draft, creator.clone(), &*self.clock)?;
        let targets = self.validate_assignees(&entries).await?;

        let mut assignees = self.expander.expand_targets(&targets).await;
        if assignees.is_empty() {
            assignees.push(creator.clone());
        }
        let assignments: Vec<Assignment> = assignees
            .iter()
            .map(|assignee| Assignment::new(task.id(), assignee.clone(), &*self.clock))
            .collect();

        self.repository.create(&task, &assignments).await?;
        tracing::info!(
            task_id = %task.id(),
            creator = %creator,
            assignees = assignments.len(),
            "task created"
        );

        emit_to_others(
            &*self.notifier,
            &assignees,
            &creator,
            NotificationKind::TaskAssigned,
            &task,
        )
        .await;
        Ok(task)
    }

    /// Applies creator-owned edits and reconciles the assignee list.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskWorkflowError::NotFound`] for an unknown task,
    /// [`super::TaskWorkflowError::Forbidden`] unless the caller created it,
    /// a validation error for invalid content or assignees, and a
    /// dependency error when a write fails.
    pub async fn update_task(
        &self,
        task_id: TaskId,
        request: UpdateTaskRequest,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        let Participation { mut task, .. } =
            Participation::load(&*self.repository, task_id, caller)
                .await?
                .require_creator()?;

        let desired = match request.assignees {
            Some(entries) => Some(self.resolve_assignees(&entries, caller).await?),
            None => None,
        };

        if !request.edit.is_empty() {
            task.edit(request.edit, &*self.clock)?;
            self.repository.update(&task).await?;
        }
        if let Some(desired) = desired {
            self.reconcile_assignees(&task, &desired, caller).await?;
        }
        Ok(task)
    }

    /// Soft-deletes a task by hiding it. Assignments are kept.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskWorkflowError::NotFound`] for an unknown task,
    /// [`super::TaskWorkflowError::Forbidden`] unless the caller created it,
    /// and a dependency error when the write fails.
    pub async fn delete_task(&self, task_id: TaskId, caller: &Identity) -> TaskWorkflowResult<()> {
        let Participation { mut task, .. } =
            Participation::load(&*self.repository, task_id, caller)
                .await?
                .require_creator()?;
        task.hide(&*self.clock);
        self.repository.update(&task).await?;
        tracing::info!(task_id = %task_id, %caller, "task hidden");
        Ok(())
    }

    /// Returns a task and its assignments.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskWorkflowError::NotFound`] for an unknown task and
    /// [`super::TaskWorkflowError::Forbidden`] unless the caller is the
    /// creator or an active assignee.
    pub async fn get_task(
        &self,
        task_id: TaskId,
        caller: &Identity,
    ) -> TaskWorkflowResult<TaskDetails> {
        let Participation { task, .. } = Participation::load(&*self.repository, task_id, caller)
            .await?
            .require_participant()?;
        let assignments = self.repository.list_assignments(task_id).await?;
        Ok(TaskDetails { task, assignments })
    }

    /// Lists the tasks `identity` created or is actively assigned to, in
    /// board order. Hidden tasks are left out.
    ///
    /// # Errors
    ///
    /// Returns a dependency error when the tasks cannot be read.
    pub async fn list_tasks_for(&self, identity: &Identity) -> TaskWorkflowResult<Vec<Task>> {
        let mut tasks = self.repository.list_visible_to(identity).await?;
        tasks.sort_by(board_order);
        Ok(tasks)
    }

    /// Sets a task's status. See [`StatusSynchronizer::set_status`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StatusSynchronizer::set_status`].
    pub async fn set_status(
        &self,
        task_id: TaskId,
        status: &str,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        self.synchronizer.set_status(task_id, status, caller).await
    }

    /// Moves a task on the board. See [`KanbanPositioner::move_kanban`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`KanbanPositioner::move_kanban`].
    pub async fn move_kanban(
        &self,
        task_id: TaskId,
        column: &str,
        position: i64,
        caller: &Identity,
    ) -> TaskWorkflowResult<Task> {
        self.positioner
            .move_kanban(task_id, column, position, caller)
            .await
    }

    /// Snoozes a task. See [`StalenessDetector::snooze`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StalenessDetector::snooze`].
    pub async fn snooze(&self, task_id: TaskId, caller: &Identity) -> TaskWorkflowResult<Task> {
        self.staleness.snooze(task_id, caller).await
    }

    /// Lists stale assigned tasks. See
    /// [`StalenessDetector::list_stale_tasks_for`].
    ///
    /// # Errors
    ///
    /// Returns the errors of [`StalenessDetector::list_stale_tasks_for`].
    pub async fn list_stale_tasks_for(&self, identity: &Identity) -> TaskWorkflowResult<Vec<Task>> {
        self.staleness.list_stale_tasks_for(identity).await
    }

    /// Parses assignee entries and checks literal addresses against the
    /// directory, collecting every offender.
    async fn validate_assignees(
        &self,
        entries: &[String],
    ) -> TaskWorkflowResult<Vec<AssigneeTarget>> {
        let mut targets = Vec::new();
        let mut rejected = Vec::new();
        for entry in entries.iter().filter(|entry| !entry.trim().is_empty()) {
            match AssigneeTarget::parse(entry) {
                Ok(AssigneeTarget::Individual(identity)) => {
                    if self.directory.is_registered(&identity).await? {
                        targets.push(AssigneeTarget::Individual(identity));
                    } else {
                        rejected.push(rejection(entry, AssigneeRejection::Unregistered));
                    }
                }
                Ok(team) => targets.push(team),
                Err(_) => rejected.push(rejection(entry, AssigneeRejection::Malformed)),
            }
        }
        if rejected.is_empty() {
            Ok(targets)
        } else {
            Err(TaskValidationError::InvalidAssignees(rejected).into())
        }
    }

    /// Validates and expands an edited assignee list, falling back to the
    /// creator when it resolves to nobody.
    async fn resolve_assignees(
        &self,
        entries: &[String],
        creator: &Identity,
    ) -> TaskWorkflowResult<Vec<Identity>> {
        let targets = self.validate_assignees(entries).await?;
        let mut assignees = self.expander.expand_targets(&targets).await;
        if assignees.is_empty() {
            assignees.push(creator.clone());
        }
        Ok(assignees)
    }

    async fn reconcile_assignees(
        &self,
        task: &Task,
        desired: &[Identity],
        caller: &Identity,
    ) -> TaskWorkflowResult<()> {
        let current: HashSet<Identity> = self
            .repository
            .list_assignments(task.id())
            .await?
            .into_iter()
            .map(|assignment| assignment.assignee().clone())
            .collect();
        let wanted: HashSet<&Identity> = desired.iter().collect();

        for stale in current.iter().filter(|identity| !wanted.contains(identity)) {
            self.repository.remove_assignment(task.id(), stale).await?;
        }
        let added: Vec<&Identity> = desired
            .iter()
            .filter(|identity| !current.contains(*identity))
            .collect();
        for identity in &added {
            let assignment = Assignment::new(task.id(), (*identity).clone(), &*self.clock);
            self.repository.add_assignment(&assignment).await?;
        }

        tracing::debug!(
            task_id = %task.id(),
            added = added.len(),
            kept = desired.len() - added.len(),
            "assignees reconciled"
        );
        emit_to_others(
            &*self.notifier,
            added,
            caller,
            NotificationKind::TaskAssigned,
            task,
        )
        .await;
        Ok(())
    }
}

fn rejection(entry: &str, reason: AssigneeRejection) -> RejectedAssignee {
    RejectedAssignee {
        entry: entry.to_owned(),
        reason,
    }
}
