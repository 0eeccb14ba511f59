#![deny(clippy::all, clippy::pedantic)]

use listingdesk::application::bulk::BulkOutcome;
use serde::Serialize;
use serde_json::json;

use crate::client::CliError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    println!("{out}");
    Ok(())
}

pub fn print_message(message: &str) -> Result<(), CliError> {
    print_json(&json!({ "message": message }))
}

/// Print both counts, then fail when any item was rejected.
pub fn print_bulk(outcome: &BulkOutcome) -> Result<(), CliError> {
    let failed: Vec<_> = outcome
        .failed
        .iter()
        .map(|failure| json!({ "id": failure.id, "message": failure.message }))
        .collect();
    print_json(&json!({
        "succeeded": outcome.succeeded.len(),
        "failed": outcome.failed.len(),
        "deleted_ids": outcome.succeeded,
        "failures": failed,
    }))?;
    if outcome.is_complete_success() {
        Ok(())
    } else {
        Err(CliError::Partial {
            failed: outcome.failed.len(),
            attempted: outcome.attempted(),
        })
    }
}
