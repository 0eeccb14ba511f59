//! listingdesk: operator console for the listing scheduler backend.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;
mod prompt;

#[cfg(test)]
mod tests;

use std::process::ExitCode;

use clap::Parser;
use listingdesk::config;
use listingdesk::infra::telemetry;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{accounts, activity, auth, posts, reports, users};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = config::load(&cli.settings)?;
    telemetry::init(&settings.logging)?;
    let sweep_interval = settings.activity.sweep_interval;
    let ctx = build_ctx_from_cli(&cli, settings)?;
    let _sweeper = ctx.activity.spawn_sweeper(sweep_interval);

    match cli.command {
        Commands::Accounts(cmd) => accounts::handle(&ctx, cmd.action).await?,
        Commands::Posts(cmd) => posts::handle(&ctx, cmd.action).await?,
        Commands::Analytics { period, account } => {
            reports::analytics(&ctx, period.into(), account).await?;
        }
        Commands::Stats => reports::stats(&ctx).await?,
        Commands::Auth(cmd) => auth::handle(&ctx, cmd.action).await?,
        Commands::Users(cmd) => users::handle(&ctx, cmd.action).await?,
        Commands::Activity(cmd) => activity::handle(&ctx, cmd.action)?,
    }

    Ok(())
}
