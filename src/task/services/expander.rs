//! Resolution of assignee lists into individual identities.

use crate::task::{
    domain::{AssigneeTarget, Identity},
    ports::IdentityDirectory,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Expands `team:<NAME>` tags into the approved members of that team.
///
/// Output is deduplicated and keeps first-seen order. A failed team lookup
/// contributes nobody; expansion itself never fails.
#[derive(Clone)]
pub struct AssignmentExpander<D>
where
    D: IdentityDirectory,
{
    directory: Arc<D>,
}

impl<D> AssignmentExpander<D>
where
    D: IdentityDirectory,
{
    /// Creates an expander that resolves teams through `directory`.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Expands parsed targets in order.
    pub async fn expand_targets(&self, targets: &[AssigneeTarget]) -> Vec<Identity> {
        let mut seen = HashSet::new();
        let mut expanded = Vec::new();
        for target in targets {
            for identity in self.resolve(target).await {
                if seen.insert(identity.clone()) {
                    expanded.push(identity);
                }
            }
        }
        expanded
    }

    async fn resolve(&self, target: &AssigneeTarget) -> Vec<Identity> {
        match target {
            AssigneeTarget::Individual(identity) => vec![identity.clone()],
            AssigneeTarget::Team(team) => match self.directory.list_approved_by_team(team).await {
                Ok(members) => {
                    if members.is_empty() {
                        tracing::debug!(team = %team, "team has no approved members");
                    }
                    members
                }
                Err(err) => {
                    tracing::warn!(
                        team = %team,
                        error = %err,
                        "team lookup failed; team contributes no assignees"
                    );
                    Vec::new()
                }
            },
        }
    }
}
