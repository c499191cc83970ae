//! Automation handling
//!
//! - [`AutomationCleaner`] strips the versioning automations from a new
//!   snapshot so the archived copy cannot create or roll back versions.
//! - [`TriggerUserResolver`] attributes the current run to a user for the
//!   ledger's "Created By" column.

use crate::error::WorkflowResult;
use crate::services::{AutomationService, Collaborators, UserDirectoryService};
use crate::types::{AutomationId, ResourceId, UserId, CREATE_VERSION_AUTOMATION, UNKNOWN_USER};
use std::sync::Arc;

/// Removes "Create Version" and "Rollback Version" from a snapshot
#[derive(Clone)]
pub struct AutomationCleaner {
    automations: Arc<dyn AutomationService>,
}

impl AutomationCleaner {
    /// Create cleaner
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            automations: collaborators.automations.clone(),
        }
    }

    /// Delete the reserved automations bound to `snapshot`
    ///
    /// Other automations on the snapshot are left alone. Only ever called
    /// with a snapshot resource, never the source document's.
    ///
    /// # Errors
    /// Collaborator failures; automations deleted before the failure stay
    /// deleted.
    pub async fn strip_automations(&self, snapshot: &ResourceId) -> WorkflowResult<Vec<AutomationId>> {
        let bound = self.automations.list_automations(snapshot).await?;

        let mut removed = Vec::new();
        for automation in bound.into_iter().filter(|a| a.is_reserved()) {
            self.automations.delete_automation(&automation.id).await?;
            tracing::info!(automation = %automation.id, name = %automation.name, "removed automation");
            removed.push(automation.id);
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for AutomationCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationCleaner").finish_non_exhaustive()
    }
}

/// Best-effort attribution of the current run
///
/// No execution id is handed to the workflow, so the in-flight run is taken
/// to be the "Create Version" automation whose latest execution has not yet
/// succeeded. An explicit user id, when known, skips that inspection.
#[derive(Clone)]
pub struct TriggerUserResolver {
    automations: Arc<dyn AutomationService>,
    users: Arc<dyn UserDirectoryService>,
}

impl TriggerUserResolver {
    /// Create resolver
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            automations: collaborators.automations.clone(),
            users: collaborators.users.clone(),
        }
    }

    /// Display name of the user running the workflow on `source`
    ///
    /// Falls back to `"Unknown"` when no in-flight run is found, the run has
    /// no user, or the user is not in the directory.
    ///
    /// # Errors
    /// Collaborator failures.
    pub async fn resolve_trigger_user(
        &self,
        source: &ResourceId,
        explicit: Option<&UserId>,
    ) -> WorkflowResult<String> {
        let user_id = match explicit {
            Some(id) => Some(id.clone()),
            None => self.in_flight_user(source).await?,
        };

        let Some(user_id) = user_id else {
            tracing::warn!("no latest executed user found");
            return Ok(UNKNOWN_USER.to_string());
        };
        tracing::info!(user = %user_id, "latest executed user");

        let users = self.users.list_users().await?;
        match users.into_iter().find(|u| u.id == user_id) {
            Some(user) => Ok(user.display_name),
            None => {
                tracing::warn!(user = %user_id, "user not found in the user list");
                Ok(UNKNOWN_USER.to_string())
            }
        }
    }

    async fn in_flight_user(&self, source: &ResourceId) -> WorkflowResult<Option<UserId>> {
        let bound = self.automations.list_automations(source).await?;
        Ok(bound
            .into_iter()
            .find(|a| a.name == CREATE_VERSION_AUTOMATION && !a.latest_execution_succeeded())
            .and_then(|a| a.latest_execution_user))
    }
}

impl std::fmt::Debug for TriggerUserResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerUserResolver").finish_non_exhaustive()
    }
}
