//! Onboarding use cases: the engine and its persistence conduit.

mod engine;
mod persistence;

pub use engine::OnboardingEngine;
pub use persistence::{data_key, step_key, PersistenceAdapter};
