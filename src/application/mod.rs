//! Application layer - orchestrates domain state through the ports.
//!
//! The onboarding engine is the only stateful component here; the
//! persistence adapter holds no state of its own.

pub mod onboarding;

pub use onboarding::{OnboardingEngine, PersistenceAdapter};
