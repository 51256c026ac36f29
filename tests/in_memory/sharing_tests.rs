//! In-memory integration tests for creating and managing shared tasks.

use super::helpers::{Workspace, at, who, workspace};
use rstest::rstest;
use taskboard::task::{
    domain::{AssignmentStatus, TaskPriority, TaskStatus, TeamName},
    ports::NotificationKind,
    services::{
        AssigneeRejection, CreateTaskRequest, ErrorKind, TaskValidationError, TaskWorkflowError,
        UpdateTaskRequest,
    },
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn team_assignment_reaches_every_approved_member(
    workspace: Workspace,
) -> Result<(), eyre::Report> {
    let task = workspace
        .create("alice@x.com", "Prepare demo", &["bob@x.com", "team:AI"])
        .await?;

    let details = workspace
        .service
        .get_task(task.id(), &who("alice@x.com"))
        .await?;

    let assignees: Vec<&str> = details
        .assignments
        .iter()
        .map(|assignment| assignment.assignee().as_str())
        .collect();
    eyre::ensure!(
        assignees == vec!["bob@x.com", "carol@x.com", "frank@x.com"],
        "unexpected assignees {assignees:?}"
    );
    eyre::ensure!(
        details
            .assignments
            .iter()
            .all(|assignment| assignment.status() == AssignmentStatus::Backlog),
        "new assignments start in the backlog"
    );
    eyre::ensure!(
        workspace.recipients() == vec!["bob@x.com", "carol@x.com", "frank@x.com"],
        "every assignee is told about the task"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn newly_registered_members_join_later_team_assignments(
    workspace: Workspace,
) -> Result<(), eyre::Report> {
    workspace.directory.register(who("dave@x.com"), None, true);
    workspace.directory.register(who("gina@x.com"), TeamName::new("AI").ok(), true);

    let task = workspace
        .create("alice@x.com", "Team retro", &["team:AI"])
        .await?;
    let details = workspace
        .service
        .get_task(task.id(), &who("alice@x.com"))
        .await?;

    let assignees: Vec<&str> = details
        .assignments
        .iter()
        .map(|assignment| assignment.assignee().as_str())
        .collect();
    eyre::ensure!(
        assignees == vec!["carol@x.com", "frank@x.com", "gina@x.com"],
        "unexpected assignees {assignees:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregistered_and_malformed_assignees_are_all_reported(workspace: Workspace) {
    let request = CreateTaskRequest::new(who("alice@x.com"), "Broken invite").with_assignees([
        "ghost@x.com".to_owned(),
        "bob@x.com".to_owned(),
        "nobody".to_owned(),
    ]);

    let err = workspace
        .service
        .create_task(request)
        .await
        .expect_err("creation should fail");

    assert_eq!(err.kind(), ErrorKind::ValidationError);
    let TaskWorkflowError::Validation(TaskValidationError::InvalidAssignees(rejected)) = err else {
        panic!("expected an invalid assignee error");
    };
    let reasons: Vec<(&str, AssigneeRejection)> = rejected
        .iter()
        .map(|entry| (entry.entry.as_str(), entry.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("ghost@x.com", AssigneeRejection::Unregistered),
            ("nobody", AssigneeRejection::Malformed),
        ]
    );
    let listed = workspace
        .service
        .list_tasks_for(&who("alice@x.com"))
        .await
        .expect("list");
    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creator_edits_content_and_assignees(workspace: Workspace) -> Result<(), eyre::Report> {
    let task = workspace
        .create("alice@x.com", "Book venue", &["bob@x.com"])
        .await?;
    workspace.notifier.clear();

    let edited = workspace
        .service
        .update_task(
            task.id(),
            UpdateTaskRequest::new()
                .with_title("Book venue and catering")
                .with_due_date(at(2026, 6, 12, 17))
                .with_priority(TaskPriority::High)
                .with_assignees(["bob@x.com".to_owned(), "carol@x.com".to_owned()]),
            &who("alice@x.com"),
        )
        .await?;

    eyre::ensure!(edited.title() == "Book venue and catering", "title not updated");
    eyre::ensure!(edited.due_date() == Some(at(2026, 6, 12, 17)), "due date not updated");
    eyre::ensure!(edited.priority() == TaskPriority::High, "priority not updated");
    let sent = workspace.notifier.sent();
    eyre::ensure!(
        sent.iter().any(|notification| notification.kind == NotificationKind::TaskAssigned
            && notification.recipient == who("carol@x.com")),
        "the new assignee is told about the task"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_task_leaves_listings_but_stays_addressable(
    workspace: Workspace,
) -> Result<(), eyre::Report> {
    let task = workspace
        .create("alice@x.com", "Old reminder", &["bob@x.com"])
        .await?;

    workspace
        .service
        .delete_task(task.id(), &who("alice@x.com"))
        .await?;

    for reader in ["alice@x.com", "bob@x.com"] {
        let listed = workspace.service.list_tasks_for(&who(reader)).await?;
        eyre::ensure!(listed.is_empty(), "{reader} still sees a deleted task");
    }
    let details = workspace
        .service
        .get_task(task.id(), &who("alice@x.com"))
        .await?;
    eyre::ensure!(
        details.task.status() == TaskStatus::Hidden,
        "deleted task should be hidden"
    );
    Ok(())
}
