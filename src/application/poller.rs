//! Posting job progress poller.
//!
//! One spawned task per job. The task polls the job status endpoint on a
//! fixed interval, backs off exponentially while requests fail, and stops at
//! the first terminal status, a `401`, the duration cap, or cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use listingdesk_api_types::{JobStatus, PostingJob};
use metrics::counter;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::gateway::JobStatusSource;
use crate::application::schedule::ScheduledTask;
use crate::config::PollerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Completed,
    Failed,
    Expired,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PollState::Idle | PollState::Polling)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Polling => "polling",
            PollState::Completed => "completed",
            PollState::Failed => "failed",
            PollState::Expired => "expired",
            PollState::Cancelled => "cancelled",
        }
    }
}

/// How a poll loop ended, handed to [`JobObserver::on_finished`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(PostingJob),
    Failed(PostingJob),
    Expired { last: Option<PostingJob> },
    Unauthorized,
}

impl PollOutcome {
    pub fn state(&self) -> PollState {
        match self {
            PollOutcome::Completed(_) => PollState::Completed,
            PollOutcome::Failed(_) | PollOutcome::Unauthorized => PollState::Failed,
            PollOutcome::Expired { .. } => PollState::Expired,
        }
    }

    pub fn job(&self) -> Option<&PostingJob> {
        match self {
            PollOutcome::Completed(job) | PollOutcome::Failed(job) => Some(job),
            PollOutcome::Expired { last } => last.as_ref(),
            PollOutcome::Unauthorized => None,
        }
    }
}

#[async_trait]
pub trait JobObserver: Send + Sync {
    async fn on_progress(&self, _job_id: &str, _job: &PostingJob) {}

    /// Called exactly once per poll loop that was not cancelled.
    async fn on_finished(&self, job_id: &str, outcome: &PollOutcome);
}

#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn JobStatusSource>,
    settings: PollerSettings,
}

impl JobPoller {
    pub fn new(source: Arc<dyn JobStatusSource>, settings: PollerSettings) -> Self {
        Self { source, settings }
    }

    pub fn start(&self, job_id: impl Into<String>, observer: Arc<dyn JobObserver>) -> PollHandle {
        let job_id = job_id.into();
        let (tx, rx) = watch::channel(PollState::Idle);
        let source = Arc::clone(&self.source);
        let settings = self.settings.clone();
        let task_job_id = job_id.clone();

        let task = ScheduledTask::spawn(move |token| {
            poll_job(source, settings, task_job_id, observer, tx, token)
        });

        PollHandle {
            job_id,
            state: rx,
            task,
        }
    }
}

/// Owner of a running poll loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct PollHandle {
    job_id: String,
    state: watch::Receiver<PollState>,
    task: ScheduledTask,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    pub fn cancel(&self) {
        self.task.cancel();
    }

    /// A receiver that outlives the handle, for waiting on the terminal state.
    pub fn watcher(&self) -> PollWatcher {
        PollWatcher {
            state: self.state.clone(),
        }
    }

    /// Wait for the loop to reach a terminal state.
    pub async fn finished(&self) -> PollState {
        self.watcher().finished().await
    }
}

#[derive(Debug, Clone)]
pub struct PollWatcher {
    state: watch::Receiver<PollState>,
}

impl PollWatcher {
    pub async fn finished(mut self) -> PollState {
        match self.state.wait_for(|state| state.is_terminal()).await {
            Ok(state) => *state,
            // Sender gone without a terminal state: the task was torn down.
            Err(_) => PollState::Cancelled,
        }
    }
}

async fn poll_job(
    source: Arc<dyn JobStatusSource>,
    settings: PollerSettings,
    job_id: String,
    observer: Arc<dyn JobObserver>,
    state: watch::Sender<PollState>,
    token: CancellationToken,
) {
    let deadline = Instant::now() + settings.max_duration;
    let mut delay = settings.interval;
    let mut last: Option<PostingJob> = None;
    state.send_replace(PollState::Polling);
    debug!(job_id = %job_id, "job polling started");

    let outcome = loop {
        counter!("listingdesk_job_polls_total").increment(1);
        let result = tokio::select! {
            () = token.cancelled() => break None,
            result = source.job_status(&job_id) => result,
        };

        match result {
            Ok(job) => {
                delay = settings.interval;
                match job.status {
                    JobStatus::Completed => break Some(PollOutcome::Completed(job)),
                    JobStatus::Failed => break Some(PollOutcome::Failed(job)),
                    JobStatus::Queued | JobStatus::Running => {
                        observer.on_progress(&job_id, &job).await;
                        last = Some(job);
                    }
                }
            }
            Err(err) if err.is_unauthorized() => break Some(PollOutcome::Unauthorized),
            Err(err) => {
                counter!("listingdesk_job_poll_errors_total").increment(1);
                delay = next_backoff(delay, settings.backoff_max);
                warn!(job_id = %job_id, error = %err, retry_in_ms = delay.as_millis() as u64, "job status poll failed");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            break Some(PollOutcome::Expired { last: last.take() });
        }
        let pause = delay.min(deadline - now);
        tokio::select! {
            () = token.cancelled() => break None,
            () = tokio::time::sleep(pause) => {}
        }
        if Instant::now() >= deadline {
            break Some(PollOutcome::Expired { last: last.take() });
        }
    };

    let Some(outcome) = outcome else {
        debug!(job_id = %job_id, "job polling cancelled");
        state.send_replace(PollState::Cancelled);
        return;
    };

    info!(job_id = %job_id, state = outcome.state().as_str(), "job polling finished");
    observer.on_finished(&job_id, &outcome).await;
    state.send_replace(outcome.state());
}

fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}
