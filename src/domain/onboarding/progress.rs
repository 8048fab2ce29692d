//! FlowProgress - read-only progress snapshot for rendering the wizard chrome.

use serde::Serialize;

use super::flow::FlowDefinition;
use super::session::OnboardingSession;
use super::variant::FlowVariant;

/// One row of the step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub index: usize,
    pub title: &'static str,
    pub is_current: bool,
    pub is_gated: bool,
}

/// Where a session stands within its flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowProgress {
    pub variant: FlowVariant,
    pub current_step_index: usize,
    pub total_steps: usize,
    pub current_title: &'static str,
    pub is_current_step_valid: bool,
    pub is_loading: bool,
    pub is_completed: bool,
    /// `Some` only when the current step is gated.
    pub gate_satisfied: Option<bool>,
    pub error: Option<String>,
    pub steps: Vec<StepProgress>,
}

impl FlowProgress {
    pub fn new(
        flow: &FlowDefinition,
        session: &OnboardingSession,
        gate_satisfied: Option<bool>,
    ) -> Self {
        let current = flow.clamp_index(session.current_step_index);
        let steps = flow
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| StepProgress {
                index,
                title: step.title,
                is_current: index == current,
                is_gated: step.is_gated(),
            })
            .collect();

        Self {
            variant: flow.variant(),
            current_step_index: current,
            total_steps: flow.total_steps(),
            current_title: flow.step(current).map(|s| s.title).unwrap_or_default(),
            is_current_step_valid: session.is_current_step_valid,
            is_loading: session.is_loading,
            is_completed: session.is_completed(),
            gate_satisfied,
            error: session.error.clone(),
            steps,
        }
    }

    /// Steps already passed, as a percentage of the flow (0-100).
    pub fn percent_complete(&self) -> u8 {
        if self.is_completed {
            return 100;
        }
        ((self.current_step_index * 100) / self.total_steps) as u8
    }

    /// 1-based label such as "Step 2 of 7".
    pub fn step_label(&self) -> String {
        format!("Step {} of {}", self.current_step_index + 1, self.total_steps)
    }
}
