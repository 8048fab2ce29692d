//! Mock onboarding API for testing.
//!
//! Provides a configurable implementation of `OnboardingApi` for unit and
//! integration tests. Supports:
//! - Call tracking
//! - One-shot and persistent error injection
//! - Holding calls until the test releases them (concurrency tests)

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::ports::{ApiError, CompleteRequest, OnboardingApi, SaveProgressRequest};

/// Recorded call for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    SaveProgress(SaveProgressRequest),
    Complete(CompleteRequest),
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    calls: Vec<ApiCall>,
    next_save_error: Option<ApiError>,
    next_complete_error: Option<ApiError>,
    save_error: Option<ApiError>,
    complete_error: Option<ApiError>,
}

/// Mock onboarding API.
///
/// # Example
///
/// ```ignore
/// let api = MockOnboardingApi::new();
/// api.fail_next_save(ApiError::Timeout);
///
/// // ... drive the engine ...
///
/// assert_eq!(api.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockOnboardingApi {
    inner: Arc<Mutex<MockState>>,
    hold: Option<Arc<Semaphore>>,
}

impl MockOnboardingApi {
    /// A mock where every call succeeds immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock where every call waits until `release` lets it through.
    pub fn held() -> Self {
        Self {
            inner: Arc::default(),
            hold: Some(Arc::new(Semaphore::new(0))),
        }
    }

    /// Lets `n` held calls (current or future) proceed.
    pub fn release(&self, n: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(n);
        }
    }

    /// The next `save_progress` fails with `error`.
    pub fn fail_next_save(&self, error: ApiError) {
        self.state().next_save_error = Some(error);
    }

    /// The next `complete` fails with `error`.
    pub fn fail_next_complete(&self, error: ApiError) {
        self.state().next_complete_error = Some(error);
    }

    /// Every `save_progress` fails until cleared with `None`.
    pub fn set_save_error(&self, error: Option<ApiError>) {
        self.state().save_error = error;
    }

    /// Every `complete` fails until cleared with `None`.
    pub fn set_complete_error(&self, error: Option<ApiError>) {
        self.state().complete_error = error;
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn save_requests(&self) -> Vec<SaveProgressRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::SaveProgress(r) => Some(r),
                ApiCall::Complete(_) => None,
            })
            .collect()
    }

    pub fn complete_requests(&self) -> Vec<CompleteRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::Complete(r) => Some(r),
                ApiCall::SaveProgress(_) => None,
            })
            .collect()
    }

    pub fn save_count(&self) -> usize {
        self.save_requests().len()
    }

    pub fn complete_count(&self) -> usize {
        self.complete_requests().len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn wait_for_release(&self) -> Result<(), ApiError> {
        if let Some(hold) = &self.hold {
            let permit = hold
                .acquire()
                .await
                .map_err(|_| ApiError::Transport("mock hold closed".to_string()))?;
            permit.forget();
        }
        Ok(())
    }
}

#[async_trait]
impl OnboardingApi for MockOnboardingApi {
    async fn save_progress(&self, request: &SaveProgressRequest) -> Result<(), ApiError> {
        self.state().calls.push(ApiCall::SaveProgress(request.clone()));
        self.wait_for_release().await?;

        let mut state = self.state();
        if let Some(error) = state.next_save_error.take() {
            return Err(error);
        }
        match &state.save_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn complete(&self, request: &CompleteRequest) -> Result<(), ApiError> {
        self.state().calls.push(ApiCall::Complete(request.clone()));
        self.wait_for_release().await?;

        let mut state = self.state();
        if let Some(error) = state.next_complete_error.take() {
            return Err(error);
        }
        match &state.complete_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
