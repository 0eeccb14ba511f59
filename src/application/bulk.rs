//! Settle-all fan-out for per-item backend calls.
//!
//! Every request is issued concurrently and every outcome is collected; one
//! failure never aborts the others.

use std::future::Future;

use futures::future::join_all;
use metrics::counter;
use tracing::warn;

use crate::application::gateway::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: Vec<i64>,
    pub failed: Vec<BulkFailure>,
    /// At least one item was rejected with a 401.
    pub unauthorized: bool,
}

impl BulkOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|failure| failure.id).collect()
    }

    /// `Unauthorized` when any item hit a 401, otherwise the outcome itself.
    pub fn session_checked(self) -> Result<Self, ApiError> {
        if self.unauthorized {
            Err(ApiError::Unauthorized)
        } else {
            Ok(self)
        }
    }
}

/// Run `op` for each id and wait for all of them. Outcomes keep input order.
pub async fn settle_all<F, Fut>(operation: &'static str, ids: &[i64], op: F) -> BulkOutcome
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    counter!("listingdesk_bulk_requests_total", "operation" => operation)
        .increment(ids.len() as u64);

    let results = join_all(ids.iter().map(|&id| {
        let call = op(id);
        async move { (id, call.await) }
    }))
    .await;

    let mut outcome = BulkOutcome::default();
    for (id, result) in results {
        match result {
            Ok(()) => outcome.succeeded.push(id),
            Err(err) => {
                warn!(operation, id, error = %err, "bulk item failed");
                outcome.unauthorized |= err.is_unauthorized();
                outcome.failed.push(BulkFailure {
                    id,
                    message: err.user_message("request failed"),
                });
            }
        }
    }

    if !outcome.failed.is_empty() {
        counter!("listingdesk_bulk_failures_total", "operation" => operation)
            .increment(outcome.failed.len() as u64);
    }
    outcome
}
