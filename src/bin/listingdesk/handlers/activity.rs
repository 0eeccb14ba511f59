#![deny(clippy::all, clippy::pedantic)]

use crate::args::ActivityCmd;
use crate::client::{CliError, Ctx};
use crate::print::{print_json, print_message};

pub fn handle(ctx: &Ctx, cmd: ActivityCmd) -> Result<(), CliError> {
    match cmd {
        ActivityCmd::List { limit } => {
            let mut entries = ctx.activity.entries();
            if let Some(limit) = limit {
                entries.truncate(limit);
            }
            print_json(&entries)
        }
        ActivityCmd::Clear => {
            ctx.activity.clear()?;
            print_message("Activity log cleared")
        }
    }
}
