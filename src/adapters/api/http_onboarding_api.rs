//! HTTP adapter for the remote onboarding service.
//!
//! Implements `OnboardingApi` over JSON POSTs:
//!
//! - `POST {base_url}/onboarding/progress` with `SaveProgressRequest`
//! - `POST {base_url}/onboarding/complete` with `CompleteRequest`
//!
//! Any 2xx is success. A 4xx with a body becomes `ApiError::Rejected`;
//! other failures keep their status code. The API key, when configured, is sent as a bearer
//! token and never logged.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::config::ApiConfig;
use crate::ports::{ApiError, CompleteRequest, OnboardingApi, SaveProgressRequest};

/// Remote onboarding service reached over HTTP.
pub struct HttpOnboardingApi {
    base_url: String,
    api_key: Option<SecretString>,
    http_client: reqwest::Client,
}

impl HttpOnboardingApi {
    /// Create an adapter for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns `ApiError::Transport` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            http_client,
        })
    }

    /// Create an adapter from application configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            config.timeout(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/onboarding/{}", self.base_url, path)
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<(), ApiError> {
        let url = self.endpoint(path);

        let mut request = self.http_client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "Onboarding API request failed");
            return Err(failure_from_response(status.as_u16(), body));
        }

        tracing::debug!(%url, status = status.as_u16(), "Onboarding API request succeeded");
        Ok(())
    }
}

/// A 4xx other than 408/429 that carries a body is the service refusing
/// the payload; anything else is reported by status.
fn failure_from_response(status: u16, body: String) -> ApiError {
    let refused = (400..500).contains(&status) && status != 408 && status != 429;
    if refused && !body.trim().is_empty() {
        ApiError::Rejected(body)
    } else {
        ApiError::Status { status, body }
    }
}

#[async_trait]
impl OnboardingApi for HttpOnboardingApi {
    async fn save_progress(&self, request: &SaveProgressRequest) -> Result<(), ApiError> {
        self.post_json("progress", request).await
    }

    async fn complete(&self, request: &CompleteRequest) -> Result<(), ApiError> {
        self.post_json("complete", request).await
    }
}
