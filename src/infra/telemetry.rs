use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber writing to stderr.
///
/// Stdout is left to command output so `--json` results stay parseable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "listingdesk_bulk_requests_total",
            Unit::Count,
            "Per-item requests issued by bulk actions."
        );
        describe_counter!(
            "listingdesk_bulk_failures_total",
            Unit::Count,
            "Per-item bulk requests that did not succeed."
        );
        describe_counter!(
            "listingdesk_job_polls_total",
            Unit::Count,
            "Posting job status requests issued by the poller."
        );
        describe_counter!(
            "listingdesk_job_poll_errors_total",
            Unit::Count,
            "Posting job status requests that failed and were retried."
        );
        describe_counter!(
            "listingdesk_unauthorized_total",
            Unit::Count,
            "Responses with status 401 that cleared stored credentials."
        );
    });
}
