//! OnboardingApi Port - remote save-progress and completion calls.
//!
//! The engine only needs to know whether each call resolved or rejected.
//! Transport and payload format beyond these requests belong to adapters.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::onboarding::{FlowVariant, OnboardingData};

/// Remote checkpoint of the wizard, sent before every forward step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveProgressRequest {
    pub variant: FlowVariant,
    /// Index of the step being left.
    pub step: usize,
    pub data: OnboardingData,
}

/// Final submission of the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompleteRequest {
    pub variant: FlowVariant,
    pub data: OnboardingData,
}

/// Errors returned by the remote onboarding service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Whether repeating the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::Timeout => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            ApiError::Rejected(_) => false,
        }
    }
}

/// Port for the remote onboarding service
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// Persist progress for the step being left.
    ///
    /// # Errors
    /// Returns `ApiError` if the service could not be reached or refused
    /// the request.
    async fn save_progress(&self, request: &SaveProgressRequest) -> Result<(), ApiError>;

    /// Submit the finished wizard.
    ///
    /// # Errors
    /// Returns `ApiError` if the service could not be reached or refused
    /// the submission.
    async fn complete(&self, request: &CompleteRequest) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn OnboardingApi) {}

    #[test]
    fn save_progress_request_serializes_variant_step_and_data() {
        let request = SaveProgressRequest {
            variant: FlowVariant::Coach,
            step: 1,
            data: OnboardingData::new().with("applicationFeePaid", true),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "variant": "coach", "step": 1, "data": { "applicationFeePaid": true } })
        );
    }

    #[test]
    fn retryable_errors_are_transient_ones() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Transport("reset".into()).is_retryable());
        assert!(ApiError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(ApiError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!ApiError::Status { status: 422, body: String::new() }.is_retryable());
        assert!(!ApiError::Rejected("duplicate".into()).is_retryable());
    }
}
