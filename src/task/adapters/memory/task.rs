//! In-memory repository for tasks and their assignments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Assignment, AssignmentStatus, ColumnPlacement, Identity, Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    assignments: BTreeMap<(TaskId, Identity), Assignment>,
}

impl InMemoryTaskState {
    fn has_active_assignment(&self, task_id: TaskId, identity: &Identity) -> bool {
        self.assignments
            .get(&(task_id, identity.clone()))
            .is_some_and(Assignment::is_active)
    }

    fn collect_tasks(&self, include: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|task| task.status() != TaskStatus::Hidden && include(task))
            .cloned()
            .collect()
    }

    fn require_task(&self, task_id: TaskId) -> TaskRepositoryResult<()> {
        if self.tasks.contains_key(&task_id) {
            Ok(())
        } else {
            Err(TaskRepositoryError::NotFound(task_id))
        }
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, task: &Task, assignments: &[Assignment]) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        let mut staged = BTreeMap::new();
        for assignment in assignments {
            let key = (task.id(), assignment.assignee().clone());
            if staged.contains_key(&key) {
                return Err(TaskRepositoryError::DuplicateAssignment {
                    task_id: task.id(),
                    assignee: assignment.assignee().clone(),
                });
            }
            staged.insert(key, assignment.clone());
        }

        state.tasks.insert(task.id(), task.clone());
        state.assignments.extend(staged);
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?;
        *stored = task.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_visible_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.collect_tasks(|task| {
            task.is_created_by(identity) || state.has_active_assignment(task.id(), identity)
        }))
    }

    async fn list_assigned_to(&self, identity: &Identity) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.collect_tasks(|task| state.has_active_assignment(task.id(), identity)))
    }

    async fn list_due_recurring(&self, now: DateTime<Utc>) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.collect_tasks(|task| {
            task.is_recurring()
                && task.parent_task_id().is_none()
                && task.due_date().is_some_and(|due| due < now)
        }))
    }

    async fn update_positions(
        &self,
        placements: &[ColumnPlacement],
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        for placement in placements {
            state.require_task(placement.task_id)?;
        }
        for placement in placements {
            if let Some(task) = state.tasks.get_mut(&placement.task_id) {
                task.place(placement.position, at);
            }
        }
        Ok(())
    }

    async fn list_assignments(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Assignment>> {
        let state = self.read()?;
        Ok(state
            .assignments
            .values()
            .filter(|assignment| assignment.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn find_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<Option<Assignment>> {
        let state = self.read()?;
        Ok(state.assignments.get(&(task_id, assignee.clone())).cloned())
    }

    async fn add_assignment(&self, assignment: &Assignment) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state.require_task(assignment.task_id())?;
        let key = (assignment.task_id(), assignment.assignee().clone());
        if state.assignments.contains_key(&key) {
            return Err(TaskRepositoryError::DuplicateAssignment {
                task_id: assignment.task_id(),
                assignee: assignment.assignee().clone(),
            });
        }
        state.assignments.insert(key, assignment.clone());
        Ok(())
    }

    async fn remove_assignment(
        &self,
        task_id: TaskId,
        assignee: &Identity,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        state
            .assignments
            .remove(&(task_id, assignee.clone()))
            .map(|_| ())
            .ok_or_else(|| TaskRepositoryError::AssignmentNotFound {
                task_id,
                assignee: assignee.clone(),
            })
    }

    async fn set_assignment_status(
        &self,
        task_id: TaskId,
        assignee: &Identity,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let assignment = state
            .assignments
            .get_mut(&(task_id, assignee.clone()))
            .ok_or_else(|| TaskRepositoryError::AssignmentNotFound {
                task_id,
                assignee: assignee.clone(),
            })?;
        assignment.set_status(status, at);
        Ok(())
    }

    async fn set_all_assignment_statuses(
        &self,
        task_id: TaskId,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<usize> {
        let mut state = self.write()?;
        let mut changed = 0;
        for assignment in state
            .assignments
            .values_mut()
            .filter(|assignment| assignment.task_id() == task_id)
        {
            assignment.set_status(status, at);
            changed += 1;
        }
        Ok(changed)
    }
}
