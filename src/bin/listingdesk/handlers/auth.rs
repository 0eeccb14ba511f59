#![deny(clippy::all, clippy::pedantic)]

use listingdesk_api_types::{ProfileUpdateRequest, RegisterRequest};
use serde_json::json;

use crate::args::AuthCmd;
use crate::client::{CliError, Ctx};
use crate::io::{read_password, read_secret_file};
use crate::print::{print_json, print_message};

pub async fn handle(ctx: &Ctx, cmd: AuthCmd) -> Result<(), CliError> {
    match cmd {
        AuthCmd::Login { email, password } => {
            let password = read_password(&password)?;
            let login = ctx.api.login(&email, &password).await?;
            print_json(&json!({ "user": login.user }))
        }
        AuthCmd::Register {
            username,
            email,
            first_name,
            last_name,
            password,
        } => {
            let password = read_password(&password)?;
            let request = RegisterRequest {
                username,
                email,
                confirm_password: password.clone(),
                password,
                first_name,
                last_name,
            };
            let response = ctx.api.register(&request).await?;
            print_json(&response)
        }
        AuthCmd::Logout => {
            ctx.api.logout().await?;
            print_message("Logged out")
        }
        AuthCmd::Me => {
            let user = ctx.api.profile().await?;
            print_json(&user)
        }
        AuthCmd::UpdateProfile {
            username,
            email,
            first_name,
            last_name,
        } => {
            let current = ctx.api.profile().await?;
            let request = ProfileUpdateRequest {
                username: username.unwrap_or(current.username),
                email: email.unwrap_or(current.email),
                first_name: first_name.unwrap_or(current.first_name),
                last_name: last_name.unwrap_or(current.last_name),
            };
            let response = ctx.api.update_profile(&request).await?;
            print_json(&response)
        }
        AuthCmd::ChangePassword {
            old_password_file,
            new_password_file,
        } => {
            let old_password = read_secret_file(&old_password_file)?;
            let new_password = read_secret_file(&new_password_file)?;
            let response = ctx
                .api
                .change_password(&old_password, &new_password, &new_password)
                .await?;
            print_json(&response)
        }
    }
}
