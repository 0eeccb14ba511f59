use std::path::Path;

use async_trait::async_trait;
use listingdesk_api_types::{
    Account, AccountCredentialsRequest, AccountId, HealthCheckResponse, ManualLoginRequest,
    MessageResponse,
};
use reqwest::Method;
use reqwest::multipart::Form;

use super::client::{ApiClient, file_part};
use crate::application::gateway::{AccountGateway, ApiError};
use crate::domain::validation;

impl ApiClient {
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Account, ApiError> {
        validation::account_credentials(email, password)?;
        let body = AccountCredentialsRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "accounts/", &body).await
    }

    /// Create the account and have the backend log in immediately.
    pub async fn add_account_with_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<MessageResponse, ApiError> {
        validation::account_credentials(email, password)?;
        let body = AccountCredentialsRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "accounts/add-with-login/", &body)
            .await
    }

    pub async fn add_manual_login(&self, email: &str) -> Result<MessageResponse, ApiError> {
        validation::email_shape(email)?;
        let body = ManualLoginRequest {
            email: email.trim().to_string(),
        };
        self.send_json(Method::POST, "accounts/add-manual-login/", &body)
            .await
    }

    /// Upload a `.txt` file with one `email:password` pair per line.
    pub async fn bulk_upload_accounts(&self, path: &Path) -> Result<serde_json::Value, ApiError> {
        validation::upload_extension(path, "txt")?;
        let form = Form::new().part("file", file_part(path).await?);
        self.send_multipart(Method::POST, "accounts/bulk-upload/", form)
            .await
    }

    pub async fn account_health(&self) -> Result<HealthCheckResponse, ApiError> {
        self.get_json("accounts/health-check/", &[]).await
    }

    pub async fn validate_session(&self, id: AccountId) -> Result<serde_json::Value, ApiError> {
        self.post_empty(&format!("accounts/{id}/validate-session/"))
            .await
    }
}

#[async_trait]
impl AccountGateway for ApiClient {
    async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.get_json("accounts/", &[]).await
    }

    async fn delete_account(&self, id: AccountId) -> Result<(), ApiError> {
        self.send_empty(Method::DELETE, &format!("accounts/{id}/"))
            .await
    }

    async fn update_session(&self, id: AccountId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("accounts/{id}/update-session/"))
            .await
    }
}
