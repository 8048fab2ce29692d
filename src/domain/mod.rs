//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `onboarding` - Flow definitions, session state, gates, and step contract

pub mod foundation;
pub mod onboarding;
