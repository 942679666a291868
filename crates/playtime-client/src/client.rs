//! Playtime HTTP client implementation.

use reqwest::{Client, StatusCode};
use std::time::Duration;

use playtime_core::{StoryId, StoryProgress};

use crate::error::ClientError;
use crate::types::{AccessResponse, ApiErrorResponse, HeartbeatRequest, HeartbeatResponse};

/// Playtime API client.
///
/// Acts on behalf of one child account, authenticating with a user token.
#[derive(Debug, Clone)]
pub struct PlaytimeClient {
    client: Client,
    base_url: String,
    user_token: String,
}

impl PlaytimeClient {
    /// Create a new playtime client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the playtime service (e.g., `"http://playtime:8080"`)
    /// * `user_token` - Bearer token of the child account
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_options(base_url, user_token, ClientOptions::default())
    }

    /// Create a new playtime client with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if the base URL is empty or the
    /// HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        user_token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL must not be empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            user_token: user_token.into(),
        })
    }

    /// Send a playback heartbeat.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn heartbeat(
        &self,
        request: &HeartbeatRequest,
    ) -> Result<HeartbeatResponse, ClientError> {
        let url = format!("{}/v1/heartbeat", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.user_token)
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ask whether a story may be played right now, without recording usage.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn check_access(&self, story_id: &StoryId) -> Result<AccessResponse, ClientError> {
        let url = format!("{}/v1/stories/{story_id}/access", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.user_token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the resume position for a story, or `None` if it was never played.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn get_progress(
        &self,
        story_id: &StoryId,
    ) -> Result<Option<StoryProgress>, ClientError> {
        let url = format!("{}/v1/progress/{story_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.user_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            return Ok(serde_json::from_slice(&body)?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => Err(ClientError::Api {
                code: api_error.error.code,
                message: api_error.error.message,
                status: status.as_u16(),
            }),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 10).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
        }
    }
}
