//! PersistenceAdapter - the engine's single conduit to storage.
//!
//! Local storage uses two independent keys per variant:
//!
//! - `onboarding_{variant}_data` - JSON object of collected data
//! - `onboarding_{variant}_step` - JSON number, the current step index
//!
//! Local writes are best-effort: failures are logged and swallowed so they
//! never block the wizard. Reads tolerate missing, malformed, or
//! partially-shaped values by falling back to `{}` / `0`. Remote calls are
//! passed straight through; the engine decides what a failure means.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::onboarding::{FlowVariant, OnboardingData, PersistedProgress};
use crate::ports::{
    ApiError, CompleteRequest, LocalStore, OnboardingApi, SaveProgressRequest,
};

/// Local storage key for a variant's collected data.
pub fn data_key(variant: FlowVariant) -> String {
    format!("onboarding_{}_data", variant)
}

/// Local storage key for a variant's current step index.
pub fn step_key(variant: FlowVariant) -> String {
    format!("onboarding_{}_step", variant)
}

/// Stateless read/write conduit over a local store and the remote API.
#[derive(Clone)]
pub struct PersistenceAdapter {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn OnboardingApi>,
}

impl PersistenceAdapter {
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn OnboardingApi>) -> Self {
        Self { local, remote }
    }

    /// Rehydrates saved progress for `variant`.
    ///
    /// Returns `None` only when neither key holds anything (a fresh
    /// session). A present-but-unusable value degrades to its default.
    pub fn load(&self, variant: FlowVariant) -> Option<PersistedProgress> {
        let raw_data = self.read(&data_key(variant));
        let raw_step = self.read(&step_key(variant));

        if raw_data.is_none() && raw_step.is_none() {
            return None;
        }

        let data = raw_data
            .map(|raw| parse_data(variant, &raw))
            .unwrap_or_default();
        let current_step_index = raw_step
            .map(|raw| parse_step(variant, &raw))
            .unwrap_or_default();

        Some(PersistedProgress::new(data, current_step_index))
    }

    /// Writes data and step index for `variant`. Never fails.
    pub fn save(&self, variant: FlowVariant, data: &OnboardingData, current_step_index: usize) {
        match serde_json::to_string(data) {
            Ok(json) => self.write(&data_key(variant), &json),
            Err(e) => tracing::warn!(%variant, error = %e, "Failed to serialize onboarding data"),
        }
        self.write(&step_key(variant), &current_step_index.to_string());
    }

    /// Removes all local progress for `variant`. Never fails.
    pub fn clear(&self, variant: FlowVariant) {
        for key in [data_key(variant), step_key(variant)] {
            if let Err(e) = self.local.remove(&key) {
                tracing::warn!(%key, error = %e, "Failed to clear local onboarding state");
            }
        }
    }

    pub async fn remote_save_progress(
        &self,
        request: &SaveProgressRequest,
    ) -> Result<(), ApiError> {
        self.remote.save_progress(request).await
    }

    pub async fn remote_complete(&self, request: &CompleteRequest) -> Result<(), ApiError> {
        self.remote.complete(request).await
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.local.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%key, error = %e, "Failed to read local onboarding state");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.local.set(key, value) {
            tracing::warn!(%key, error = %e, "Failed to write local onboarding state");
        }
    }
}

fn parse_data(variant: FlowVariant, raw: &str) -> OnboardingData {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => OnboardingData::from(map),
        Ok(Value::Null) => OnboardingData::new(),
        Ok(_) | Err(_) => {
            tracing::warn!(%variant, "Discarding malformed persisted onboarding data");
            OnboardingData::new()
        }
    }
}

fn parse_step(variant: FlowVariant, raw: &str) -> usize {
    let parsed = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Number(n)) => n.as_u64(),
        // Older builds stored the index as a quoted string.
        Ok(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match parsed.and_then(|n| usize::try_from(n).ok()) {
        Some(index) => index,
        None => {
            tracing::warn!(%variant, "Discarding malformed persisted step index");
            0
        }
    }
}
