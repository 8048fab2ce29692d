//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the onboarding engine and the outside world. Adapters implement these
//! ports.
//!
//! - `LocalStore` - device-local key/value storage used for resumability
//! - `OnboardingApi` - remote save-progress and completion service

mod local_store;
mod onboarding_api;

pub use local_store::{LocalStore, LocalStoreError};
pub use onboarding_api::{ApiError, CompleteRequest, OnboardingApi, SaveProgressRequest};
