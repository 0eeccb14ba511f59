use listingdesk_api_types::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ManagedUser, MessageResponse,
    ProfileUpdateRequest, ProfileUpdateResponse, RegisterRequest, RegisterResponse, User, UserId,
    UserListResponse,
};
use reqwest::Method;
use tracing::{info, warn};

use super::client::ApiClient;
use crate::application::gateway::ApiError;
use crate::domain::error::ValidationError;
use crate::domain::validation;

impl ApiClient {
    /// Log in and store the access token and profile for later calls.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        validation::require("email", email)?;
        validation::require("password", password)?;
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let login: LoginResponse = self
            .send_json(Method::POST, "auth/login/", &body)
            .await
            .map_err(|err| match err {
                ApiError::Unauthorized => {
                    ApiError::server(401, Some("Invalid credentials".to_string()))
                }
                other => other,
            })?;
        self.credentials().save_login(&login)?;
        info!(user = %login.user.username, "logged in");
        Ok(login)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        validation::registration(
            &request.username,
            &request.email,
            &request.password,
            &request.confirm_password,
        )?;
        self.send_json(Method::POST, "auth/register/", request).await
    }

    /// Tell the backend about the logout, then drop local credentials even
    /// when the call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.send_empty(Method::POST, "auth/logout/").await;
        if let Err(err) = &result {
            warn!(error = %err, "logout request failed");
        }
        self.credentials().clear()?;
        match result {
            Ok(()) | Err(ApiError::Unauthorized) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub async fn profile(&self) -> Result<User, ApiError> {
        let user: User = self.get_json("auth/user/", &[]).await?;
        self.credentials().save_user(&user)?;
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        request: &ProfileUpdateRequest,
    ) -> Result<ProfileUpdateResponse, ApiError> {
        validation::require("username", &request.username)?;
        validation::email_shape(&request.email)?;
        let response: ProfileUpdateResponse =
            self.send_json(Method::PUT, "auth/user/", request).await?;
        self.credentials().save_user(&response.user)?;
        Ok(response)
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<MessageResponse, ApiError> {
        validation::require("old_password", old_password)?;
        validation::password_strength(new_password)?;
        if new_password != confirm_password {
            return Err(ValidationError::invalid(
                "confirm_password",
                "Passwords do not match",
            )
            .into());
        }
        let body = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_json(Method::POST, "auth/change-password/", &body)
            .await
    }

    pub async fn list_users(&self) -> Result<Vec<ManagedUser>, ApiError> {
        let list: UserListResponse = self.get_json("auth/users/", &[]).await?;
        Ok(list.users)
    }

    pub async fn approve_user(&self, id: UserId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("auth/users/{id}/approve/")).await
    }

    pub async fn disapprove_user(&self, id: UserId) -> Result<MessageResponse, ApiError> {
        self.post_empty(&format!("auth/users/{id}/disapprove/"))
            .await
    }
}
