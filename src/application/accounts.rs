//! Account actions that need confirmation or fan out over several ids.

use std::sync::Arc;

use listingdesk_api_types::{Account, AccountId};
use tracing::{info, warn};

use crate::application::activity::{ActivityKind, ActivityLog};
use crate::application::bulk::{BulkOutcome, settle_all};
use crate::application::confirm::{Confirm, Confirmation};
use crate::application::error::WorkspaceError;
use crate::application::gateway::AccountGateway;
use crate::domain::error::ValidationError;

const SESSION_PROMPT: &str = "This will open a browser window for you to log in to Facebook. \
The session will be saved once you complete the login. Continue?";

pub struct AccountDesk {
    gateway: Arc<dyn AccountGateway>,
    activity: Arc<ActivityLog>,
    confirm: Arc<dyn Confirm>,
}

impl AccountDesk {
    pub fn new(
        gateway: Arc<dyn AccountGateway>,
        activity: Arc<ActivityLog>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            gateway,
            activity,
            confirm,
        }
    }

    pub async fn list(&self) -> Result<Vec<Account>, WorkspaceError> {
        self.gateway
            .list_accounts()
            .await
            .map_err(|err| WorkspaceError::request(err, "Failed to load accounts"))
    }

    /// Delete one account. `email` is only used in the confirmation text.
    pub async fn delete_account(
        &self,
        id: AccountId,
        email: Option<&str>,
    ) -> Result<(), WorkspaceError> {
        let shown = email.unwrap_or("this account");
        let confirmation = Confirmation::danger(
            "Delete Account",
            format!(
                "Are you sure you want to delete the account \"{shown}\"? This action cannot be undone."
            ),
            "Delete",
        );
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        self.gateway
            .delete_account(id)
            .await
            .map_err(|err| WorkspaceError::request(err, "Failed to delete account"))?;
        self.record("Account deleted", format!("\"{shown}\" removed"));
        Ok(())
    }

    pub async fn delete_accounts(&self, ids: &[AccountId]) -> Result<BulkOutcome, WorkspaceError> {
        if ids.is_empty() {
            return Err(
                ValidationError::selection("Please select at least one account to delete").into(),
            );
        }
        let confirmation = Confirmation::danger(
            "Delete Selected Accounts",
            format!(
                "Are you sure you want to delete {} account(s)? This action cannot be undone.",
                ids.len()
            ),
            "Delete All",
        );
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        let gateway = &self.gateway;
        let outcome = settle_all("delete_account", ids, |id| gateway.delete_account(id)).await;
        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk account delete settled"
        );
        if !outcome.succeeded.is_empty() {
            self.record(
                "Accounts deleted",
                format!("{} account(s) removed", outcome.succeeded.len()),
            );
        }
        outcome
            .session_checked()
            .map_err(|err| WorkspaceError::request(err, "Failed to delete accounts"))
    }

    /// Ask the backend to open a browser login for the account.
    pub async fn update_session(&self, id: AccountId) -> Result<String, WorkspaceError> {
        let confirmation = Confirmation::info("Update Session", SESSION_PROMPT, "Continue");
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        let response = self.gateway.update_session(id).await.map_err(|err| {
            WorkspaceError::request(err, "Failed to update session. Please try again.")
        })?;
        self.record("Session update started", format!("Account {id}"));
        Ok(response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| {
                "Browser opening for login. Please complete the login process.".to_string()
            }))
    }

    fn record(&self, message: &str, details: String) {
        if let Err(err) = self.activity.append(ActivityKind::Account, message, details) {
            warn!(error = %err, message, "failed to record activity");
        }
    }
}
