#![deny(clippy::all, clippy::pedantic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use listingdesk::application::activity::ActivityKind;
use listingdesk::application::gateway::JobStatusSource;
use listingdesk::application::poller::{JobObserver, PollOutcome, PollState};
use listingdesk::application::workspace::PostsWorkspace;
use listingdesk::domain::selection::Partition;
use listingdesk::infra::http::{PostForm, PostPatch};
use listingdesk_api_types::{PostId, PostingJob};
use serde_json::json;

use crate::args::{PartitionArg, PostsCmd};
use crate::client::{CliError, Ctx};
use crate::io::{parse_time, parse_time_opt, read_opt_value};
use crate::print::{print_bulk, print_json};

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List { partition } => list(ctx, partition).await,
        PostsCmd::Summary => {
            let workspace = ctx.posts();
            let stats = workspace.refresh().await?;
            print_json(&stats)
        }
        PostsCmd::Create {
            account_id,
            title,
            description,
            description_file,
            price,
            scheduled_time,
            image,
        } => {
            let description = read_opt_value(description, description_file)?
                .ok_or_else(|| CliError::InvalidInput("description required".into()))?;
            let form = PostForm {
                account_id,
                title,
                description,
                price,
                scheduled_time: parse_time(&scheduled_time)?,
                image,
            };
            let post = ctx.api.create_post(&form).await?;
            ctx.posts().record(
                ActivityKind::Create,
                "Post created",
                "New post added to pending posts",
            );
            print_json(&post)
        }
        PostsCmd::Update {
            id,
            account_id,
            title,
            description,
            description_file,
            price,
            scheduled_time,
            image,
        } => {
            let patch = PostPatch {
                account_id,
                title,
                description: read_opt_value(description, description_file)?,
                price,
                scheduled_time: parse_time_opt(scheduled_time)?,
                image,
            };
            if patch.is_empty() {
                return Err(CliError::InvalidInput("nothing to update".into()));
            }
            let post = ctx.api.update_post(id, &patch).await?;
            ctx.posts().record(
                ActivityKind::Edit,
                "Post updated",
                format!("\"{}\" has been edited", post.title),
            );
            print_json(&post)
        }
        PostsCmd::Delete { id } => {
            let workspace = ctx.posts();
            workspace.refresh().await?;
            workspace.delete_post(id).await?;
            print_json(&json!({ "deleted": id }))
        }
        PostsCmd::DeleteSelected {
            partition,
            all,
            ids,
        } => delete_selected(ctx, partition.into(), all, &ids).await,
        PostsCmd::Start { ids, watch } => start(ctx, &ids, watch).await,
        PostsCmd::Watch { job_id } => {
            let printer = Arc::new(ProgressPrinter::default());
            let workspace = ctx.posts().with_progress(printer.clone());
            workspace.refresh().await?;
            workspace.track_job(&job_id);
            finish_watch(&workspace, &printer, &job_id).await
        }
        PostsCmd::JobStatus { job_id } => {
            let job = ctx.api.job_status(&job_id).await?;
            print_json(&job)
        }
        PostsCmd::ErrorLogs => {
            let logs = ctx.api.error_logs().await?;
            print_json(&logs)
        }
        PostsCmd::BulkUpload { csv, accounts } => {
            let response = ctx.api.bulk_upload_posts(&csv, &accounts).await?;
            let uploaded = response
                .get("created_count")
                .or_else(|| response.get("count"))
                .and_then(serde_json::Value::as_u64);
            let details = match uploaded {
                Some(count) => format!("{count} posts uploaded successfully"),
                None => format!("{} uploaded successfully", csv.display()),
            };
            ctx.posts()
                .record(ActivityKind::Bulk, "Bulk upload completed", details);
            print_json(&response)
        }
    }
}

async fn list(ctx: &Ctx, partition: Option<PartitionArg>) -> Result<(), CliError> {
    let workspace = ctx.posts();
    workspace.refresh().await?;
    let posts = workspace.with_board(|board| {
        board
            .posts()
            .iter()
            .filter(|post| {
                partition.is_none_or(|p| Partition::of(post.posted) == Partition::from(p))
            })
            .cloned()
            .collect::<Vec<_>>()
    });
    print_json(&posts)
}

/// Select `ids` in `partition`, rejecting ids that belong elsewhere.
fn select(workspace: &PostsWorkspace, partition: Partition, ids: &[PostId]) -> Result<(), CliError> {
    for &id in ids {
        let already = workspace.with_board(|board| board.selection(partition).contains(id));
        if already {
            continue;
        }
        if !workspace.toggle(partition, id) {
            return Err(CliError::InvalidInput(format!(
                "post {id} is not a {} post",
                partition.as_str()
            )));
        }
    }
    Ok(())
}

async fn delete_selected(
    ctx: &Ctx,
    partition: Partition,
    all: bool,
    ids: &[PostId],
) -> Result<(), CliError> {
    let workspace = ctx.posts();
    workspace.refresh().await?;
    if all {
        workspace.select_all(partition);
    } else {
        select(&workspace, partition, ids)?;
    }
    let outcome = workspace.delete_selected(partition).await?;
    print_bulk(&outcome)
}

async fn start(ctx: &Ctx, ids: &[PostId], watch: bool) -> Result<(), CliError> {
    let printer = Arc::new(ProgressPrinter::default());
    let workspace = ctx.posts().with_progress(printer.clone());
    workspace.refresh().await?;
    select(&workspace, Partition::Pending, ids)?;

    let started = workspace.start_posting().await?;
    print_json(&json!({
        "message": started.message,
        "post_ids": started.post_ids,
        "job_id": started.job_id,
    }))?;

    match (&started.job_id, watch) {
        (Some(job_id), true) => finish_watch(&workspace, &printer, job_id).await,
        (None, true) => Err(CliError::InvalidInput(
            "the backend returned no job id to watch".into(),
        )),
        (_, false) => {
            workspace.cancel_job();
            Ok(())
        }
    }
}

async fn finish_watch(
    workspace: &PostsWorkspace,
    printer: &ProgressPrinter,
    job_id: &str,
) -> Result<(), CliError> {
    let state = workspace.wait_for_job().await.unwrap_or(PollState::Cancelled);
    if printer.unauthorized.load(Ordering::Acquire) {
        return Err(CliError::SessionExpired);
    }
    let stats = workspace.stats();
    print_json(&json!({
        "job_id": job_id,
        "state": state.as_str(),
        "posts": stats,
    }))?;
    match state {
        PollState::Completed => Ok(()),
        other => Err(CliError::JobUnfinished {
            job_id: job_id.to_string(),
            state: other.as_str(),
        }),
    }
}

/// Progress lines on stderr so stdout stays JSON.
#[derive(Default)]
struct ProgressPrinter {
    unauthorized: AtomicBool,
}

#[async_trait]
impl JobObserver for ProgressPrinter {
    async fn on_progress(&self, job_id: &str, job: &PostingJob) {
        let current = job.current_post_title.as_deref().unwrap_or("-");
        eprintln!(
            "job {job_id}: {} {}/{} done, {} failed ({:.0}%), current: {current}",
            job.status.as_str(),
            job.completed_posts,
            job.total_posts,
            job.failed_posts,
            job.progress_percentage,
        );
    }

    async fn on_finished(&self, job_id: &str, outcome: &PollOutcome) {
        if matches!(outcome, PollOutcome::Unauthorized) {
            self.unauthorized.store(true, Ordering::Release);
        }
        eprintln!("job {job_id}: {}", outcome.state().as_str());
    }
}
