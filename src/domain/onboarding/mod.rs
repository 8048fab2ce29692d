//! Onboarding domain - pure state for the multi-step onboarding wizards.
//!
//! Nothing here performs I/O. The engine in `application::onboarding`
//! drives these types through the persistence and remote ports.

mod data;
mod flow;
mod gate;
mod outcome;
mod policy;
mod progress;
mod session;
mod step;
mod step_contract;
mod variant;

pub use data::OnboardingData;
pub use flow::{FlowDefinition, APPLICATION_FEE_GATE, CLIENT_STEPS, COACH_STEPS};
pub use gate::{ExternalEventGate, GateState, GatingBridge, GatingSignal};
pub use outcome::{BlockReason, Outcome};
pub use policy::NavigationPolicy;
pub use progress::{FlowProgress, StepProgress};
pub use session::{OnboardingSession, PersistedProgress, SessionStatus};
pub use step::{GatingKind, StepDescriptor};
pub use step_contract::{RequiredFields, StepContract, StepSink};
pub use variant::FlowVariant;
