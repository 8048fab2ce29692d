//! Remote onboarding API adapters
//!
//! - **HttpOnboardingApi** - JSON over HTTP via reqwest
//! - **MockOnboardingApi** - Call log and error injection for tests

mod http_onboarding_api;
mod mock_onboarding_api;

pub use http_onboarding_api::HttpOnboardingApi;
pub use mock_onboarding_api::{ApiCall, MockOnboardingApi};
