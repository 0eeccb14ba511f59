//! Posts workspace: the post board, its selections, bulk actions and the
//! posting job tracker, wired to the backend and the activity log.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use listingdesk_api_types::{PostId, PostingJob};
use tracing::{info, warn};

use crate::application::activity::{ActivityKind, ActivityLog};
use crate::application::bulk::{BulkOutcome, settle_all};
use crate::application::confirm::{Confirm, Confirmation};
use crate::application::error::WorkspaceError;
use crate::application::gateway::PostGateway;
use crate::application::poller::{JobObserver, JobPoller, PollHandle, PollOutcome, PollState};
use crate::domain::board::{BoardStats, PostBoard};
use crate::domain::error::ValidationError;
use crate::domain::selection::Partition;

/// Result of a successful start-posting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingStarted {
    pub message: String,
    pub post_ids: Vec<PostId>,
    pub job_id: Option<String>,
}

struct Shared {
    gateway: Arc<dyn PostGateway>,
    board: Mutex<PostBoard>,
    activity: Arc<ActivityLog>,
}

impl Shared {
    fn with_board<R>(&self, f: impl FnOnce(&mut PostBoard) -> R) -> R {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut board)
    }

    async fn refresh(&self) -> Result<BoardStats, WorkspaceError> {
        let posts = self
            .gateway
            .list_posts()
            .await
            .map_err(|err| WorkspaceError::request(err, "Failed to load posts"))?;
        Ok(self.with_board(|board| {
            board.replace_posts(posts);
            board.stats()
        }))
    }

    fn record(&self, kind: ActivityKind, message: &str, details: String) {
        if let Err(err) = self.activity.append(kind, message, details) {
            warn!(error = %err, message, "failed to record activity");
        }
    }
}

pub struct PostsWorkspace {
    shared: Arc<Shared>,
    poller: JobPoller,
    confirm: Arc<dyn Confirm>,
    progress: Option<Arc<dyn JobObserver>>,
    active_job: Mutex<Option<PollHandle>>,
}

impl PostsWorkspace {
    pub fn new(
        gateway: Arc<dyn PostGateway>,
        poller: JobPoller,
        activity: Arc<ActivityLog>,
        confirm: Arc<dyn Confirm>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                board: Mutex::new(PostBoard::default()),
                activity,
            }),
            poller,
            confirm,
            progress: None,
            active_job: Mutex::new(None),
        }
    }

    /// Forward job progress and completion to `observer` as well.
    #[must_use]
    pub fn with_progress(mut self, observer: Arc<dyn JobObserver>) -> Self {
        self.progress = Some(observer);
        self
    }

    pub fn activity(&self) -> &Arc<ActivityLog> {
        &self.shared.activity
    }

    /// Reload the post list. Both selections are cleared.
    pub async fn refresh(&self) -> Result<BoardStats, WorkspaceError> {
        self.shared.refresh().await
    }

    pub fn with_board<R>(&self, f: impl FnOnce(&PostBoard) -> R) -> R {
        self.shared.with_board(|board| f(board))
    }

    pub fn stats(&self) -> BoardStats {
        self.with_board(PostBoard::stats)
    }

    pub fn toggle(&self, partition: Partition, id: PostId) -> bool {
        self.shared.with_board(|board| board.toggle(partition, id))
    }

    pub fn select_all(&self, partition: Partition) {
        self.shared.with_board(|board| board.select_all(partition));
    }

    pub fn clear_selection(&self, partition: Partition) {
        self.shared.with_board(|board| board.clear_selection(partition));
    }

    pub fn record(&self, kind: ActivityKind, message: &str, details: impl Into<String>) {
        self.shared.record(kind, message, details.into());
    }

    pub async fn delete_post(&self, id: PostId) -> Result<(), WorkspaceError> {
        let title = self
            .with_board(|board| board.find(id).map(|post| post.title.clone()));
        let shown = title.as_deref().unwrap_or("this post");
        let confirmation = Confirmation::danger(
            "Delete Post",
            format!("Are you sure you want to delete \"{shown}\"? This action cannot be undone."),
            "Delete",
        );
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        self.shared
            .gateway
            .delete_post(id)
            .await
            .map_err(|err| WorkspaceError::request(err, "Failed to delete post"))?;

        self.shared.with_board(|board| board.remove_posts(&[id]));
        if let Some(title) = title {
            self.shared.record(
                ActivityKind::Delete,
                "Post deleted",
                format!("\"{title}\" removed from listings"),
            );
        }
        Ok(())
    }

    /// Delete every post selected in `partition`, settling all requests.
    ///
    /// Succeeded ids leave the list and the selection. Failed ids stay in
    /// both so the operator can retry them. A 401 on any item is returned as
    /// an unauthorized request error once the successes are applied.
    pub async fn delete_selected(&self, partition: Partition) -> Result<BulkOutcome, WorkspaceError> {
        let ids = self.with_board(|board| board.selection(partition).ids());
        let count = ids.len();
        let confirmation = match partition {
            Partition::Pending => {
                if ids.is_empty() {
                    return Err(ValidationError::selection(
                        "Please select at least one post to delete",
                    )
                    .into());
                }
                Confirmation::danger(
                    "Delete Selected Posts",
                    format!(
                        "Are you sure you want to delete {count} selected post(s)? This action cannot be undone."
                    ),
                    "Delete All",
                )
            }
            Partition::Posted => {
                if ids.is_empty() {
                    return Err(ValidationError::selection(
                        "Please select at least one posted item to delete",
                    )
                    .into());
                }
                Confirmation::danger(
                    "Delete Posted Items",
                    format!(
                        "Are you sure you want to delete {count} selected posted item(s)? This action cannot be undone."
                    ),
                    "Delete",
                )
            }
        };
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        let gateway = &self.shared.gateway;
        let outcome = settle_all("delete_post", &ids, |id| gateway.delete_post(id)).await;
        info!(
            partition = partition.as_str(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk delete settled"
        );

        if !outcome.succeeded.is_empty() {
            self.shared
                .with_board(|board| board.remove_posts(&outcome.succeeded));
            let removed = outcome.succeeded.len();
            match partition {
                Partition::Pending => self.shared.record(
                    ActivityKind::Delete,
                    "Bulk deletion",
                    format!("{removed} pending posts removed from queue"),
                ),
                Partition::Posted => self.shared.record(
                    ActivityKind::Delete,
                    "Posted items deleted",
                    format!("{removed} posted item(s) removed from listings"),
                ),
            }
        }
        outcome
            .session_checked()
            .map_err(|err| WorkspaceError::request(err, "Failed to delete posts"))
    }

    /// Start a posting run for the pending selection, or for every pending
    /// post when nothing is selected. A returned job id starts the tracker.
    pub async fn start_posting(&self) -> Result<PostingStarted, WorkspaceError> {
        let (ids, explicit) = self.with_board(|board| {
            let selected = board.selection(Partition::Pending).ids();
            if selected.is_empty() {
                (board.candidates(Partition::Pending), false)
            } else {
                (selected, true)
            }
        });
        if ids.is_empty() {
            return Err(ValidationError::selection("No pending posts available").into());
        }

        let count = ids.len();
        let prompt = if explicit {
            format!("Start posting {count} selected post(s) to Facebook Marketplace?")
        } else {
            format!("Start posting all {count} pending post(s) to Facebook Marketplace?")
        };
        let confirmation = Confirmation::info("Start Posting", prompt, "Start Posting");
        if !self.confirm.confirm(&confirmation) {
            return Err(WorkspaceError::Declined);
        }

        self.shared.record(
            ActivityKind::Post,
            "Posting initiated",
            format!("Starting to post {count} item(s) to Facebook Marketplace..."),
        );

        let response = match self.shared.gateway.start_posting(&ids).await {
            Ok(response) => response,
            Err(err) => {
                let err = WorkspaceError::request(err, "Failed to start posting process");
                self.shared.record(
                    ActivityKind::Post,
                    "Posting failed",
                    format!("Failed to start posting: {err}"),
                );
                return Err(err);
            }
        };

        let message = response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Started posting {count} post(s)!"));
        self.clear_selection(Partition::Pending);

        let job_id = response.job_id.filter(|job_id| !job_id.trim().is_empty());
        if let Some(job_id) = &job_id {
            self.track_job(job_id);
        }

        Ok(PostingStarted {
            message,
            post_ids: ids,
            job_id,
        })
    }

    /// Track `job_id`, replacing and cancelling any job tracked before.
    pub fn track_job(&self, job_id: &str) {
        let observer = Arc::new(RefreshOnFinish {
            shared: Arc::clone(&self.shared),
            forward: self.progress.clone(),
        });
        let handle = self.poller.start(job_id, observer);
        let previous = self
            .active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    pub fn active_job(&self) -> Option<(String, PollState)> {
        self.active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|handle| (handle.job_id().to_string(), handle.state()))
    }

    /// Wait until the tracked job reaches a terminal state. By then the
    /// post list has been refreshed.
    pub async fn wait_for_job(&self) -> Option<PollState> {
        let watcher = self
            .active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(PollHandle::watcher)?;
        Some(watcher.finished().await)
    }

    pub fn cancel_job(&self) {
        if let Some(handle) = self
            .active_job
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.cancel();
        }
    }
}

/// Refreshes the board once when a tracked job finishes.
struct RefreshOnFinish {
    shared: Arc<Shared>,
    forward: Option<Arc<dyn JobObserver>>,
}

#[async_trait]
impl JobObserver for RefreshOnFinish {
    async fn on_progress(&self, job_id: &str, job: &PostingJob) {
        if let Some(forward) = &self.forward {
            forward.on_progress(job_id, job).await;
        }
    }

    async fn on_finished(&self, job_id: &str, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Unauthorized => {
                warn!(job_id, "stopped tracking job: session expired");
            }
            _ => {
                if let Err(err) = self.shared.refresh().await {
                    warn!(job_id, error = %err, "failed to refresh posts after job");
                }
                let (message, details) = match outcome {
                    PollOutcome::Completed(_) => (
                        "Posting completed",
                        "All posts have been processed".to_string(),
                    ),
                    PollOutcome::Failed(job) => (
                        "Posting failed",
                        job.error_message
                            .clone()
                            .unwrap_or_else(|| format!("Posting job {job_id} failed")),
                    ),
                    _ => (
                        "Posting tracking stopped",
                        format!("Job {job_id} was still running when tracking gave up"),
                    ),
                };
                self.shared.record(ActivityKind::Post, message, details);
            }
        }

        if let Some(forward) = &self.forward {
            forward.on_finished(job_id, outcome).await;
        }
    }
}
