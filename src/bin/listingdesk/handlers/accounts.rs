#![deny(clippy::all, clippy::pedantic)]

use listingdesk::application::activity::ActivityKind;
use listingdesk_api_types::AccountId;
use tracing::warn;

use crate::args::AccountsCmd;
use crate::client::{CliError, Ctx};
use crate::io::read_password;
use crate::print::{print_bulk, print_json, print_message};

pub async fn handle(ctx: &Ctx, cmd: AccountsCmd) -> Result<(), CliError> {
    match cmd {
        AccountsCmd::List => {
            let accounts = ctx.accounts().list().await?;
            print_json(&accounts)
        }
        AccountsCmd::Add { email, password } => {
            let password = read_password(&password)?;
            let account = ctx.api.create_account(&email, &password).await?;
            record(ctx, "Account added", format!("{} added", account.email));
            print_json(&account)
        }
        AccountsCmd::AddWithLogin { email, password } => {
            let password = read_password(&password)?;
            let response = ctx.api.add_account_with_login(&email, &password).await?;
            record(ctx, "Account added", format!("{} added with login", email.trim()));
            print_json(&response)
        }
        AccountsCmd::ManualLogin { email } => {
            let response = ctx.api.add_manual_login(&email).await?;
            print_json(&response)
        }
        AccountsCmd::BulkUpload { file } => {
            let response = ctx.api.bulk_upload_accounts(&file).await?;
            record(
                ctx,
                "Bulk account upload",
                format!("{} uploaded", file.display()),
            );
            print_json(&response)
        }
        AccountsCmd::Delete { ids } => delete(ctx, &ids).await,
        AccountsCmd::UpdateSession { id } => {
            let message = ctx.accounts().update_session(id).await?;
            print_message(&message)
        }
        AccountsCmd::Health => {
            let report = ctx.api.account_health().await?;
            print_json(&report)
        }
        AccountsCmd::ValidateSession { id } => {
            let result = ctx.api.validate_session(id).await?;
            print_json(&result)
        }
    }
}

async fn delete(ctx: &Ctx, ids: &[AccountId]) -> Result<(), CliError> {
    let desk = ctx.accounts();
    if let [id] = ids {
        let accounts = desk.list().await?;
        let email = accounts
            .iter()
            .find(|account| account.id == *id)
            .map(|account| account.email.as_str());
        desk.delete_account(*id, email).await?;
        return print_json(&serde_json::json!({ "deleted": id }));
    }
    let outcome = desk.delete_accounts(ids).await?;
    print_bulk(&outcome)
}

fn record(ctx: &Ctx, message: &str, details: String) {
    if let Err(err) = ctx.activity.append(ActivityKind::Account, message, details) {
        warn!(error = %err, message, "failed to record activity");
    }
}
