//! Fire-and-forget notification helpers.

use crate::task::{
    domain::{Identity, Task},
    ports::{Notification, NotificationEmitter, NotificationKind},
};

/// Sends one notification, logging and swallowing any failure.
///
/// Returns `true` when the emitter accepted the request.
pub(super) async fn emit<N>(notifier: &N, notification: Notification) -> bool
where
    N: NotificationEmitter + ?Sized,
{
    match notifier.notify(&notification).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                recipient = %notification.recipient,
                kind = %notification.kind,
                error = %err,
                "notification request failed"
            );
            false
        }
    }
}

/// Tells every recipient except the actor about a change to `task`.
pub(super) async fn emit_to_others<'a, N>(
    notifier: &N,
    recipients: impl IntoIterator<Item = &'a Identity>,
    actor: &Identity,
    kind: NotificationKind,
    task: &Task,
) where
    N: NotificationEmitter + ?Sized,
{
    for recipient in recipients.into_iter().filter(|recipient| *recipient != actor) {
        let notification =
            Notification::about_task(recipient.clone(), kind, task).with_actor(actor);
        emit(notifier, notification).await;
    }
}
