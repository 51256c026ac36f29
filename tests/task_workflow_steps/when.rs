//! When steps for task workflow BDD scenarios.

use super::world::{TaskWorkflowWorld, entries, identity, run_async};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskboard::task::services::CreateTaskRequest;

#[when(r#""{caller}" sets the status to "{status}""#)]
fn set_status(
    world: &mut TaskWorkflowWorld,
    caller: String,
    status: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let updated = run_async(world.service.set_status(task_id, &status, &identity(&caller)?))
        .wrap_err("set task status")?;
    world.current_task = Some(updated);
    Ok(())
}

#[when("{days:i64} days pass")]
fn days_pass(world: &mut TaskWorkflowWorld, days: i64) {
    world.clock.advance(TimeDelta::days(days));
}

#[when(r#""{caller}" snoozes the task"#)]
fn snooze(world: &mut TaskWorkflowWorld, caller: String) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let snoozed = run_async(world.service.snooze(task_id, &identity(&caller)?))
        .wrap_err("snooze task")?;
    world.current_task = Some(snoozed);
    Ok(())
}

#[when(r#""{creator}" tries to create "{title}" for "{assignees}""#)]
fn try_create(
    world: &mut TaskWorkflowWorld,
    creator: String,
    title: String,
    assignees: String,
) -> Result<(), eyre::Report> {
    let request =
        CreateTaskRequest::new(identity(&creator)?, title).with_assignees(entries(&assignees));
    world.last_create_result = Some(run_async(world.service.create_task(request)));
    Ok(())
}
