//! Traits describing the backend operations the coordinators depend on.

use async_trait::async_trait;
use listingdesk_api_types::{
    Account, AccountId, MessageResponse, Post, PostId, PostingJob, StartPostingResponse,
};
use thiserror::Error;

use crate::application::storage::StoreError;
use crate::domain::error::ValidationError;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session expired or invalid, log in again")]
    Unauthorized,
    #[error("server responded with status {status}{}", render_server_message(.message.as_deref()))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("credential storage failed: {0}")]
    Store(String),
}

fn render_server_message(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

impl ApiError {
    pub fn server(status: u16, message: Option<String>) -> Self {
        Self::Server { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Text shown to the operator: the server's own message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Server {
                message: Some(message),
                ..
            } => message.clone(),
            ApiError::Validation(err) => err.to_string(),
            ApiError::Unauthorized => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

#[async_trait]
pub trait PostGateway: Send + Sync {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError>;
    async fn delete_post(&self, id: PostId) -> Result<(), ApiError>;
    async fn start_posting(&self, post_ids: &[PostId]) -> Result<StartPostingResponse, ApiError>;
}

#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<PostingJob, ApiError>;
}

#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>, ApiError>;
    async fn delete_account(&self, id: AccountId) -> Result<(), ApiError>;
    async fn update_session(&self, id: AccountId) -> Result<MessageResponse, ApiError>;
}
