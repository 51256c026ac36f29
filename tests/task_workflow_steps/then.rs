//! Then steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, entries, identity, run_async};
use chrono::TimeDelta;
use mockable::Clock;
use rstest_bdd_macros::then;
use taskboard::task::{
    domain::{AssignmentStatus, TaskStatus},
    services::{TaskValidationError, TaskWorkflowError},
};

#[then(r#"the task is assigned to "{assignees}""#)]
fn task_assigned_to(world: &TaskWorkflowWorld, assignees: String) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let details = run_async(world.service.get_task(task.id(), task.created_by()))?;
    let actual: Vec<String> = details
        .assignments
        .iter()
        .map(|assignment| assignment.assignee().to_string())
        .collect();
    let expected = entries(&assignees);
    eyre::ensure!(
        actual == expected,
        "expected assignees {expected:?}, found {actual:?}"
    );
    Ok(())
}

#[then(r#"the assignment of "{assignee}" is "{status}""#)]
fn assignment_status_is(
    world: &TaskWorkflowWorld,
    assignee: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = AssignmentStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;
    let details = run_async(world.service.get_task(task.id(), task.created_by()))?;
    let assignee = identity(&assignee)?;
    let assignment = details
        .assignments
        .iter()
        .find(|assignment| assignment.assignee() == &assignee)
        .ok_or_else(|| eyre::eyre!("no assignment for {assignee}"))?;

    if assignment.status() != expected {
        return Err(eyre::eyre!(
            "expected {assignee} to be {}, found {}",
            expected.as_str(),
            assignment.status().as_str()
        ));
    }
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskWorkflowWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;
    let details = run_async(world.service.get_task(task.id(), task.created_by()))?;

    if details.task.status() != expected {
        return Err(eyre::eyre!(
            "expected task status {}, found {}",
            expected.as_str(),
            details.task.status().as_str()
        ));
    }
    Ok(())
}

fn is_stale_for(world: &TaskWorkflowWorld, assignee: &str) -> Result<bool, eyre::Report> {
    let task_id = world.task()?.id();
    let stale = run_async(world.service.list_stale_tasks_for(&identity(assignee)?))?;
    Ok(stale.iter().any(|task| task.id() == task_id))
}

#[then(r#"the task is stale for "{assignee}""#)]
fn task_is_stale(world: &TaskWorkflowWorld, assignee: String) -> Result<(), eyre::Report> {
    eyre::ensure!(is_stale_for(world, &assignee)?, "task should be stale");
    Ok(())
}

#[then(r#"the task is not stale for "{assignee}""#)]
fn task_is_not_stale(world: &TaskWorkflowWorld, assignee: String) -> Result<(), eyre::Report> {
    eyre::ensure!(!is_stale_for(world, &assignee)?, "task should not be stale");
    Ok(())
}

#[then("the task is snoozed for {hours:i64} hours")]
fn task_is_snoozed_for(world: &TaskWorkflowWorld, hours: i64) -> Result<(), eyre::Report> {
    let expected = world.clock.utc() + TimeDelta::hours(hours);
    let snoozed_until = world.task()?.snoozed_until();
    eyre::ensure!(
        snoozed_until == Some(expected),
        "expected snooze until {expected}, found {snoozed_until:?}"
    );
    Ok(())
}

#[then(r#"creation fails naming "{entry}""#)]
fn creation_fails_naming(world: &TaskWorkflowWorld, entry: String) -> Result<(), eyre::Report> {
    let result = world
        .last_create_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing creation result"))?;

    let Err(TaskWorkflowError::Validation(TaskValidationError::InvalidAssignees(rejected))) =
        result
    else {
        return Err(eyre::eyre!("expected InvalidAssignees error, got {result:?}"));
    };
    let named: Vec<&str> = rejected.iter().map(|entry| entry.entry.as_str()).collect();
    eyre::ensure!(named == vec![entry.as_str()], "unexpected rejections {named:?}");
    Ok(())
}

#[then(r#""{owner}" has no tasks"#)]
fn has_no_tasks(world: &TaskWorkflowWorld, owner: String) -> Result<(), eyre::Report> {
    let tasks = run_async(world.service.list_tasks_for(&identity(&owner)?))?;
    eyre::ensure!(tasks.is_empty(), "expected no tasks, found {}", tasks.len());
    Ok(())
}
