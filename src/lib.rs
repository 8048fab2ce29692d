//! Wellness Onboarding - multi-step onboarding flow engine
//!
//! Drives the client-intake and coach-application wizards through their
//! ordered steps with per-step validation, resumable local progress, remote
//! checkpoints, and an external payment gate on the coach flow.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
