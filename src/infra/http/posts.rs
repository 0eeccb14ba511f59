use std::path::{Path, PathBuf};

use async_trait::async_trait;
use listingdesk_api_types::{
    AccountId, ErrorLog, Post, PostId, PostingJob, StartPostingRequest, StartPostingResponse,
};
use reqwest::Method;
use reqwest::multipart::Form;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::client::{ApiClient, file_part};
use crate::application::gateway::{ApiError, JobStatusSource, PostGateway};
use crate::domain::error::ValidationError;
use crate::domain::validation;

/// Fields of a new listing.
#[derive(Debug, Clone)]
pub struct PostForm {
    pub account_id: AccountId,
    pub title: String,
    pub description: String,
    pub price: String,
    pub scheduled_time: OffsetDateTime,
    pub image: Option<PathBuf>,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::post_title(&self.title)?;
        validation::post_description(&self.description)?;
        validation::post_price(&self.price)
    }
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub account_id: Option<AccountId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub scheduled_time: Option<OffsetDateTime>,
    pub image: Option<PathBuf>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.account_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.scheduled_time.is_none()
            && self.image.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validation::post_title(title)?;
        }
        if let Some(description) = &self.description {
            validation::post_description(description)?;
        }
        if let Some(price) = &self.price {
            validation::post_price(price)?;
        }
        Ok(())
    }
}

fn format_time(value: OffsetDateTime) -> Result<String, ApiError> {
    value
        .format(&Rfc3339)
        .map_err(|err| ValidationError::invalid("scheduled_time", err.to_string()).into())
}

async fn attach_image(form: Form, image: Option<&Path>) -> Result<Form, ApiError> {
    match image {
        Some(path) => Ok(form.part("image", file_part(path).await?)),
        None => Ok(form),
    }
}

impl ApiClient {
    pub async fn create_post(&self, post: &PostForm) -> Result<Post, ApiError> {
        post.validate()?;
        let form = Form::new()
            .text("title", post.title.trim().to_string())
            .text("description", post.description.trim().to_string())
            .text("price", post.price.trim().to_string())
            .text("account_id", post.account_id.to_string())
            .text("scheduled_time", format_time(post.scheduled_time)?);
        let form = attach_image(form, post.image.as_deref()).await?;
        self.send_multipart(Method::POST, "posts/", form).await
    }

    pub async fn update_post(&self, id: PostId, patch: &PostPatch) -> Result<Post, ApiError> {
        patch.validate()?;
        let mut form = Form::new();
        if let Some(title) = &patch.title {
            form = form.text("title", title.trim().to_string());
        }
        if let Some(description) = &patch.description {
            form = form.text("description", description.trim().to_string());
        }
        if let Some(price) = &patch.price {
            form = form.text("price", price.trim().to_string());
        }
        if let Some(account_id) = patch.account_id {
            form = form.text("account_id", account_id.to_string());
        }
        if let Some(scheduled_time) = patch.scheduled_time {
            form = form.text("scheduled_time", format_time(scheduled_time)?);
        }
        let form = attach_image(form, patch.image.as_deref()).await?;
        self.send_multipart(Method::PUT, &format!("posts/{id}/"), form)
            .await
    }

    /// Upload a CSV of listings (`title,description,price,image_url`) for `accounts`.
    pub async fn bulk_upload_posts(
        &self,
        csv: &Path,
        accounts: &[AccountId],
    ) -> Result<serde_json::Value, ApiError> {
        validation::upload_extension(csv, "csv")?;
        if accounts.is_empty() {
            return Err(ValidationError::selection("Please select at least one account").into());
        }
        let mut form = Form::new().part("csv_file", file_part(csv).await?);
        for account in accounts {
            form = form.text("accounts[]", account.to_string());
        }
        self.send_multipart(Method::POST, "posts/bulk-upload/", form)
            .await
    }

    pub async fn error_logs(&self) -> Result<Vec<ErrorLog>, ApiError> {
        self.get_json("posts/error-logs/", &[]).await
    }
}

#[async_trait]
impl PostGateway for ApiClient {
    async fn list_posts(&self) -> Result<Vec<Post>, ApiError> {
        self.get_json("posts/", &[]).await
    }

    async fn delete_post(&self, id: PostId) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &format!("posts/{id}/"))
            .await
    }

    async fn start_posting(&self, post_ids: &[PostId]) -> Result<StartPostingResponse, ApiError> {
        let body = StartPostingRequest {
            post_ids: post_ids.to_vec(),
        };
        self.send_json(Method::POST, "posts/start-posting/", &body)
            .await
    }
}

#[async_trait]
impl JobStatusSource for ApiClient {
    async fn job_status(&self, job_id: &str) -> Result<PostingJob, ApiError> {
        let url = self.segment_url("posts/job-status/", job_id)?;
        self.get_json_at(url).await
    }
}
