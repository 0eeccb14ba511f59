#![deny(clippy::all, clippy::pedantic)]

use listingdesk_api_types::AnalyticsPeriod;

use crate::client::{CliError, Ctx};
use crate::print::print_json;

pub async fn analytics(
    ctx: &Ctx,
    period: AnalyticsPeriod,
    account: Option<String>,
) -> Result<(), CliError> {
    let report = ctx.api.analytics(period, account.as_deref()).await?;
    print_json(&report)
}

pub async fn stats(ctx: &Ctx) -> Result<(), CliError> {
    let stats = ctx.api.dashboard_stats().await?;
    print_json(&stats)
}
