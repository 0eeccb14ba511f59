use thiserror::Error;

use crate::application::gateway::ApiError;
use crate::domain::error::ValidationError;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("action cancelled")]
    Declined,
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl WorkspaceError {
    /// Wrap a gateway error, keeping the server text or `fallback` for display.
    pub fn request(source: ApiError, fallback: &str) -> Self {
        Self::Request {
            message: source.user_message(fallback),
            source,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, WorkspaceError::Request { source, .. } if source.is_unauthorized())
    }
}
