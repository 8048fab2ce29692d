//! Navigation policy knobs for the onboarding engine.

use serde::{Deserialize, Serialize};

/// Rules the engine applies on navigation and submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPolicy {
    /// When true, `previous()` marks the revisited step valid: it was
    /// validated on the way forward, so going back never blocks `next()`
    /// until the step itself reports otherwise.
    pub trust_previous_steps: bool,

    /// When true, `next()`/`complete()` called while a submission is in
    /// flight is blocked instead of issuing a second remote call.
    pub reject_reentrant_submissions: bool,
}

impl NavigationPolicy {
    pub const TRUST_PREVIOUS_STEPS: bool = true;
    pub const REJECT_REENTRANT_SUBMISSIONS: bool = true;

    /// Validity assigned to a step entered through `previous()`.
    pub fn validity_on_back_navigation(&self) -> bool {
        self.trust_previous_steps
    }
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self {
            trust_previous_steps: Self::TRUST_PREVIOUS_STEPS,
            reject_reentrant_submissions: Self::REJECT_REENTRANT_SUBMISSIONS,
        }
    }
}
