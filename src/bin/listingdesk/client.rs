#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use listingdesk::application::accounts::AccountDesk;
use listingdesk::application::activity::ActivityLog;
use listingdesk::application::confirm::{AutoConfirm, Confirm};
use listingdesk::application::error::WorkspaceError;
use listingdesk::application::gateway::ApiError;
use listingdesk::application::poller::JobPoller;
use listingdesk::application::session::Credentials;
use listingdesk::application::storage::{KeyValueStore, StoreError};
use listingdesk::application::workspace::PostsWorkspace;
use listingdesk::config::{LoadError, Settings};
use listingdesk::infra::error::InfraError;
use listingdesk::infra::http::ApiClient;
use listingdesk::infra::storage::FileStore;
use thiserror::Error;

use crate::args::Cli;
use crate::prompt::StdinConfirm;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to read token file: {0}")]
    TokenFile(std::io::Error),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("session expired or invalid, log in again with `listingdesk auth login`")]
    SessionExpired,
    #[error("action cancelled")]
    Declined,
    #[error("{0}")]
    Api(ApiError),
    #[error("{0}")]
    Workspace(WorkspaceError),
    #[error("{failed} of {attempted} requests failed")]
    Partial { failed: usize, attempted: usize },
    #[error("posting job {job_id} ended as {state}")]
    JobUnfinished { job_id: String, state: &'static str },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to render output: {0}")]
    Output(String),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => CliError::SessionExpired,
            other => CliError::Api(other),
        }
    }
}

impl From<WorkspaceError> for CliError {
    fn from(err: WorkspaceError) -> Self {
        if err.is_unauthorized() {
            return CliError::SessionExpired;
        }
        match err {
            WorkspaceError::Declined => CliError::Declined,
            other => CliError::Workspace(other),
        }
    }
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::SessionExpired => ExitCode::from(3),
            CliError::Declined => ExitCode::from(4),
            CliError::Partial { .. } | CliError::JobUnfinished { .. } => ExitCode::from(5),
            CliError::InvalidInput(_)
            | CliError::Config(_)
            | CliError::Api(ApiError::Validation(_))
            | CliError::Workspace(WorkspaceError::Validation(_)) => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

/// Everything a handler needs, built once per invocation.
pub struct Ctx {
    pub api: Arc<ApiClient>,
    pub activity: Arc<ActivityLog>,
    pub confirm: Arc<dyn Confirm>,
    pub settings: Settings,
}

impl Ctx {
    pub fn new(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        token: Option<String>,
        confirm: Arc<dyn Confirm>,
    ) -> Result<Self, CliError> {
        let credentials = Credentials::new(Arc::clone(&store));
        let api = ApiClient::new(&settings.api, credentials)?.with_token(token);
        let activity = ActivityLog::load(store, settings.activity.retention);
        Ok(Self {
            api: Arc::new(api),
            activity: Arc::new(activity),
            confirm,
            settings,
        })
    }

    pub fn posts(&self) -> PostsWorkspace {
        let poller = JobPoller::new(self.api.clone(), self.settings.poller.clone());
        PostsWorkspace::new(
            self.api.clone(),
            poller,
            Arc::clone(&self.activity),
            Arc::clone(&self.confirm),
        )
    }

    pub fn accounts(&self) -> AccountDesk {
        AccountDesk::new(
            self.api.clone(),
            Arc::clone(&self.activity),
            Arc::clone(&self.confirm),
        )
    }
}

pub fn build_ctx_from_cli(cli: &Cli, settings: Settings) -> Result<Ctx, CliError> {
    let token = match &cli.token_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .map_err(CliError::TokenFile)?
                .trim()
                .to_string(),
        ),
        None => cli.token_env.clone(),
    };
    let store = FileStore::open(&settings.storage.data_dir)?;
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(StdinConfirm)
    };
    Ctx::new(settings, Arc::new(store), token, confirm)
}
