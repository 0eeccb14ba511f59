use listingdesk_api_types::ErrorBody;
use metrics::counter;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::gateway::ApiError;
use crate::application::session::Credentials;
use crate::config::ApiSettings;
use crate::infra::error::InfraError;

/// Authenticated client for the scheduler backend.
///
/// The bearer token is read from the credential store on every request, so a
/// login or a `401` is visible to the next call without rebuilding the client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    credentials: Credentials,
    token_override: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, credentials: Credentials) -> Result<Self, InfraError> {
        let http = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;
        Ok(Self {
            http,
            base: settings.base_url.clone(),
            credentials,
            token_override: None,
        })
    }

    /// Use `token` instead of the stored one, e.g. from `--token-file`.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token_override = token.filter(|token| !token.trim().is_empty());
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::Transport(format!("invalid url {path}: {err}")))
    }

    /// `prefix` joined to the base with `segment` appended as one escaped
    /// path segment and a trailing slash.
    pub fn segment_url(&self, prefix: &str, segment: &str) -> Result<Url, ApiError> {
        let mut url = self.url(prefix)?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Transport(format!("invalid url {prefix}")))?
            .pop_if_empty()
            .push(segment)
            .push("");
        Ok(url)
    }

    fn token(&self) -> Result<Option<String>, ApiError> {
        if let Some(token) = &self.token_override {
            return Ok(Some(token.clone()));
        }
        Ok(self.credentials.token()?)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<RequestBuilder, ApiError> {
        let mut url = self.url(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        self.request_to(method, url)
    }

    fn request_to(&self, method: Method, url: Url) -> Result<RequestBuilder, ApiError> {
        let mut req = self.http.request(method, url);
        if let Some(token) = self.token()? {
            let header = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|err| ApiError::Transport(format!("invalid token: {err}")))?;
            req = req.header(AUTHORIZATION, header);
        }
        Ok(req)
    }

    /// Send and classify the response. A `401` clears stored credentials.
    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = resp.status();
        debug!(status = status.as_u16(), url = %resp.url(), "api response");
        if status.is_success() {
            return Ok(resp);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            counter!("listingdesk_unauthorized_total").increment(1);
            if let Err(err) = self.credentials.clear() {
                warn!(error = %err, "failed to clear credentials after 401");
            }
            return Err(ApiError::Unauthorized);
        }

        let bytes = resp.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.best_message().map(str::to_string));
        Err(ApiError::server(status.as_u16(), message))
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode(err.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let resp = self.send(self.request(Method::GET, path, query)?).await?;
        Self::decode(resp).await
    }

    pub async fn get_json_at<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let resp = self.send(self.request_to(Method::GET, url)?).await?;
        Self::decode(resp).await
    }

    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.request(method, path, &[])?.json(body);
        let resp = self.send(req).await?;
        Self::decode(resp).await
    }

    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        let req = self.request(method, path, &[])?.multipart(form);
        let resp = self.send(req).await?;
        Self::decode(resp).await
    }

    /// Body-less request whose response body is ignored.
    pub async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        self.send(self.request(method, path, &[])?).await?;
        Ok(())
    }

    /// Body-less request with a JSON response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.send(self.request(Method::POST, path, &[])?).await?;
        Self::decode(resp).await
    }
}

/// Read `path` into a multipart part named after the file.
pub(crate) async fn file_part(path: &std::path::Path) -> Result<reqwest::multipart::Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ApiError::Transport(format!("failed to read {}: {err}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime.essence_str())
        .map_err(|err| ApiError::Transport(err.to_string()))
}
