//! In-memory integration tests for status propagation and board moves.

use super::helpers::{Workspace, who, workspace};
use rstest::rstest;
use taskboard::task::{
    domain::{AssignmentStatus, TaskId, TaskStatus},
    services::{ForbiddenReason, TaskWorkflowError},
};

async fn assignment_statuses(
    workspace: &Workspace,
    task_id: TaskId,
) -> Result<Vec<(String, AssignmentStatus)>, eyre::Report> {
    let details = workspace
        .service
        .get_task(task_id, &who("alice@x.com"))
        .await?;
    Ok(details
        .assignments
        .iter()
        .map(|assignment| (assignment.assignee().to_string(), assignment.status()))
        .collect())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignee_and_creator_updates_propagate_differently(
    workspace: Workspace,
) -> Result<(), eyre::Report> {
    let task = workspace
        .create("alice@x.com", "Quarterly report", &["bob@x.com", "carol@x.com"])
        .await?;

    let after_review = workspace
        .service
        .set_status(task.id(), "review", &who("bob@x.com"))
        .await?;
    eyre::ensure!(
        after_review.status() == TaskStatus::Review,
        "aggregate follows the assignee"
    );
    eyre::ensure!(
        assignment_statuses(&workspace, task.id()).await?
            == vec![
                ("bob@x.com".to_owned(), AssignmentStatus::Review),
                ("carol@x.com".to_owned(), AssignmentStatus::Backlog),
            ],
        "only bob's assignment moves"
    );

    let after_done = workspace
        .service
        .set_status(task.id(), "done", &who("alice@x.com"))
        .await?;
    eyre::ensure!(after_done.status() == TaskStatus::Done, "creator sets done");
    eyre::ensure!(
        assignment_statuses(&workspace, task.id()).await?
            == vec![
                ("bob@x.com".to_owned(), AssignmentStatus::Done),
                ("carol@x.com".to_owned(), AssignmentStatus::Done),
            ],
        "creator status reaches every assignment"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_touch_a_task(workspace: Workspace) -> Result<(), eyre::Report> {
    let task = workspace
        .create("alice@x.com", "Private", &["bob@x.com"])
        .await?;
    let stranger = who("carol@x.com");

    let status = workspace
        .service
        .set_status(task.id(), "done", &stranger)
        .await;
    let read = workspace.service.get_task(task.id(), &stranger).await;

    eyre::ensure!(
        matches!(
            status,
            Err(TaskWorkflowError::Forbidden {
                reason: ForbiddenReason::NotParticipant,
                ..
            })
        ),
        "status change by a stranger should be forbidden"
    );
    eyre::ensure!(
        matches!(read, Err(TaskWorkflowError::Forbidden { .. })),
        "read by a stranger should be forbidden"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_moves_keep_columns_densely_ranked(
    workspace: Workspace,
) -> Result<(), eyre::Report> {
    let bob = who("bob@x.com");
    let mut ids = Vec::new();
    for title in ["Alpha", "Beta", "Gamma"] {
        let task = workspace.create("alice@x.com", title, &["bob@x.com"]).await?;
        workspace
            .service
            .move_kanban(task.id(), "in_progress", 99, &bob)
            .await?;
        ids.push(task.id());
    }

    workspace
        .service
        .move_kanban(ids[2], "in_progress", 0, &bob)
        .await?;

    let board = workspace.service.list_tasks_for(&bob).await?;
    let ranked: Vec<(TaskId, TaskStatus, i64)> = board
        .iter()
        .map(|task| (task.id(), task.status(), task.position()))
        .collect();
    eyre::ensure!(
        ranked
            == vec![
                (ids[2], TaskStatus::InProgress, 0),
                (ids[0], TaskStatus::InProgress, 1),
                (ids[1], TaskStatus::InProgress, 2),
            ],
        "unexpected board {ranked:?}"
    );
    Ok(())
}
