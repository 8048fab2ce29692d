//! Engine policy configuration

use serde::Deserialize;

use crate::domain::onboarding::NavigationPolicy;

/// Toggles for the onboarding engine's navigation policy
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_trust_previous_steps")]
    pub trust_previous_steps: bool,

    #[serde(default = "default_reject_reentrant_submissions")]
    pub reject_reentrant_submissions: bool,
}

fn default_trust_previous_steps() -> bool {
    NavigationPolicy::TRUST_PREVIOUS_STEPS
}

fn default_reject_reentrant_submissions() -> bool {
    NavigationPolicy::REJECT_REENTRANT_SUBMISSIONS
}

impl EngineConfig {
    pub fn policy(&self) -> NavigationPolicy {
        NavigationPolicy {
            trust_previous_steps: self.trust_previous_steps,
            reject_reentrant_submissions: self.reject_reentrant_submissions,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trust_previous_steps: default_trust_previous_steps(),
            reject_reentrant_submissions: default_reject_reentrant_submissions(),
        }
    }
}
