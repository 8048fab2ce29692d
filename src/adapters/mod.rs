//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the onboarding engine to external systems:
//! - `storage` - LocalStore implementations (file, in-memory)
//! - `api` - OnboardingApi implementations (HTTP, mock)

pub mod api;
pub mod storage;

pub use api::{ApiCall, HttpOnboardingApi, MockOnboardingApi};
pub use storage::{FileLocalStore, InMemoryLocalStore};
