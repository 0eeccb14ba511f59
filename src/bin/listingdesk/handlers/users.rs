#![deny(clippy::all, clippy::pedantic)]

use listingdesk::application::confirm::Confirmation;
use listingdesk_api_types::UserId;

use crate::args::UsersCmd;
use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: UsersCmd) -> Result<(), CliError> {
    match cmd {
        UsersCmd::List { pending } => {
            let mut users = ctx.api.list_users().await?;
            if pending {
                users.retain(|user| !user.is_approved);
            }
            print_json(&users)
        }
        UsersCmd::Approve { id } => {
            let response = ctx.api.approve_user(id).await?;
            print_json(&response)
        }
        UsersCmd::Disapprove { id } => disapprove(ctx, id).await,
    }
}

async fn disapprove(ctx: &Ctx, id: UserId) -> Result<(), CliError> {
    let confirmation = Confirmation::danger(
        "Disapprove User",
        format!("Revoke approval for user {id}? They will no longer be able to log in."),
        "Disapprove",
    );
    if !ctx.confirm.confirm(&confirmation) {
        return Err(CliError::Declined);
    }
    let response = ctx.api.disapprove_user(id).await?;
    print_json(&response)
}
