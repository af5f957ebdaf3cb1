//! API client for the Animoji backend.
//!
//! This module provides the `ApiClient` struct for the auth endpoints (which
//! hand out bearer tokens) and the bearer-authenticated image endpoints.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{
    AuthResponse, Credentials, GenerateRequest, GoogleAuthRequest, GoogleAuthResponse, Image,
    LikeResponse, SaveImageRequest,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

pub type ApiResult<T> = Result<T, ApiError>;

/// API client for the Animoji backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token,
            initial_backoff: self.initial_backoff,
        }
    }

    /// Override the first rate-limit backoff delay
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/images/{id}[/{action}]` with the id encoded as a single path segment
    fn image_url(&self, image_id: &str, action: Option<&str>) -> ApiResult<String> {
        if matches!(image_id, "" | "." | "..") {
            return Err(ApiError::BadRequest(format!("Invalid image id: {:?}", image_id)));
        }
        let mut url = Url::parse(&self.url("/images"))
            .map_err(|e| ApiError::BadRequest(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::BadRequest(format!("Invalid API base URL: {}", self.base_url)))?
            .push(image_id)
            .extend(action);
        Ok(url.to_string())
    }

    // ===== Auth =====

    /// Exchange username and password for a token
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post("/auth/login", &Credentials { username, password }).await
    }

    /// Create an account; the response carries a token for the new user
    pub async fn signup(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post("/auth/signup", &Credentials { username, password }).await
    }

    /// Returns `Ok(false)` when the username is taken.
    pub async fn check_username(&self, username: &str) -> ApiResult<bool> {
        let url = self.url("/auth/check-username");
        let response = self
            .execute(|| self.client.get(&url).query(&[("username", username)]))
            .await?;

        match response.status() {
            s if s.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::from_status(status, &body))
            }
        }
    }

    /// Exchange a Google ID token for an API token
    pub async fn google_login(&self, credential: &str) -> ApiResult<GoogleAuthResponse> {
        self.post("/auth/google", &GoogleAuthRequest { token: credential }).await
    }

    // ===== Images =====

    /// Fetch the gallery, newest first
    pub async fn list_images(&self) -> ApiResult<Vec<Image>> {
        self.get("/images").await
    }

    pub async fn generate_image(&self, prompt: &str) -> ApiResult<Image> {
        self.post("/images/generate", &GenerateRequest { prompt }).await
    }

    pub async fn save_image(&self, image: &Image, original_input: &str) -> ApiResult<Image> {
        self.post("/images", &SaveImageRequest::new(image, original_input)).await
    }

    /// Returns the new like count
    pub async fn like_image(&self, image_id: &str) -> ApiResult<i64> {
        let url = self.image_url(image_id, Some("like"))?;
        let response =
            Self::check(self.execute(|| self.authorized(self.client.post(&url))).await?).await?;
        let like: LikeResponse = Self::parse(response, &url).await?;
        Ok(like.likes)
    }

    pub async fn delete_image(&self, image_id: &str) -> ApiResult<()> {
        let url = self.image_url(image_id, None)?;
        Self::check(self.execute(|| self.authorized(self.client.delete(&url))).await?)
            .await?;
        Ok(())
    }

    /// Download raw image bytes from an absolute URL
    pub async fn fetch_bytes(&self, url: &str) -> ApiResult<Vec<u8>> {
        let response = Self::check(self.execute(|| self.client.get(url)).await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ===== Plumbing =====

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token.trim()),
            None => request,
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn execute<F>(&self, build: F) -> ApiResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let response = build().send().await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            retries += 1;
            if retries > MAX_RATE_LIMIT_RETRIES {
                return Err(ApiError::RateLimited);
            }
            warn!(url = %response.url(), retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
            tokio::time::sleep(backoff).await;
            backoff *= 2; // Exponential backoff
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let url = response.url().to_string();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, %url, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        let response =
            Self::check(self.execute(|| self.authorized(self.client.get(&url))).await?).await?;
        Self::parse(response, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        let url = self.url(path);
        let response = Self::check(
            self.execute(|| self.authorized(self.client.post(&url)).json(body))
                .await?,
        )
        .await?;
        Self::parse(response, &url).await
    }
}
