//! OnboardingSession - the in-memory state owned by one engine instance.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::data::OnboardingData;
use super::flow::FlowDefinition;
use super::variant::FlowVariant;
use crate::domain::foundation::{SessionId, StateMachine, Timestamp};

/// Lifecycle of an onboarding session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Completed,
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (SessionStatus::InProgress, SessionStatus::Completed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            SessionStatus::InProgress => vec![SessionStatus::Completed],
            SessionStatus::Completed => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// What survives a reload: the data and the step the user was on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedProgress {
    pub data: OnboardingData,
    pub current_step_index: usize,
}

impl PersistedProgress {
    pub fn new(data: OnboardingData, current_step_index: usize) -> Self {
        Self {
            data,
            current_step_index,
        }
    }
}

/// Snapshot of an onboarding session.
///
/// The engine holds the only mutable copy; callers receive clones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingSession {
    pub id: SessionId,
    pub variant: FlowVariant,
    pub status: SessionStatus,
    pub current_step_index: usize,
    pub data: OnboardingData,
    pub is_current_step_valid: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub started_at: Timestamp,
    pub last_saved_at: Option<Timestamp>,
}

impl OnboardingSession {
    /// A fresh session at the first step with no data.
    pub fn new(variant: FlowVariant) -> Self {
        Self {
            id: SessionId::new(),
            variant,
            status: SessionStatus::InProgress,
            current_step_index: 0,
            data: OnboardingData::new(),
            is_current_step_valid: false,
            is_loading: false,
            error: None,
            started_at: Timestamp::now(),
            last_saved_at: None,
        }
    }

    /// A session resumed from persisted progress.
    ///
    /// The stored index is clamped into the flow so a flow that shrank since
    /// the last visit still resumes on a real step.
    pub fn rehydrated(flow: &FlowDefinition, progress: PersistedProgress) -> Self {
        let mut session = Self::new(flow.variant());
        session.current_step_index = flow.clamp_index(progress.current_step_index);
        session.data = progress.data;
        session
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// What a reload should restore for this session.
    pub fn to_progress(&self) -> PersistedProgress {
        PersistedProgress::new(self.data.clone(), self.current_step_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::onboarding::step::StepDescriptor;

    #[test]
    fn new_session_starts_at_first_step_invalid() {
        let session = OnboardingSession::new(FlowVariant::Client);
        assert_eq!(session.current_step_index, 0);
        assert!(session.data.is_empty());
        assert!(!session.is_current_step_valid);
        assert!(!session.is_loading);
        assert!(session.error.is_none());
        assert_eq!(session.status, SessionStatus::InProgress);
    }

    #[test]
    fn rehydrated_session_restores_index_and_data() {
        let flow = FlowDefinition::for_variant(FlowVariant::Client);
        let progress = PersistedProgress::new(OnboardingData::new().with("firstName", "Ana"), 3);

        let session = OnboardingSession::rehydrated(&flow, progress);

        assert_eq!(session.current_step_index, 3);
        assert_eq!(session.data.get_str("firstName"), Some("Ana"));
        assert!(!session.is_current_step_valid);
    }

    #[test]
    fn rehydrated_session_clamps_index_from_longer_flow() {
        let flow = FlowDefinition::custom(
            FlowVariant::Client,
            vec![StepDescriptor::new("One"), StepDescriptor::new("Two")],
        )
        .unwrap();
        let session =
            OnboardingSession::rehydrated(&flow, PersistedProgress::new(OnboardingData::new(), 7));
        assert_eq!(session.current_step_index, 1);
    }

    #[test]
    fn status_only_moves_forward_to_completed() {
        assert!(SessionStatus::InProgress
            .transition_to(SessionStatus::Completed)
            .is_ok());
        assert!(SessionStatus::Completed
            .transition_to(SessionStatus::InProgress)
            .is_err());
        assert!(SessionStatus::Completed.is_terminal());
    }

    #[test]
    fn session_is_completed_once_status_is_terminal() {
        let mut session = OnboardingSession::new(FlowVariant::Client);
        assert!(!session.is_completed());

        session.status = session.status.transition_to(SessionStatus::Completed).unwrap();
        assert!(session.is_completed());
    }

    #[test]
    fn session_serializes_camel_case_fields() {
        let json = serde_json::to_value(OnboardingSession::new(FlowVariant::Coach)).unwrap();
        assert_eq!(json["variant"], "coach");
        assert_eq!(json["currentStepIndex"], 0);
        assert_eq!(json["isCurrentStepValid"], false);
        assert_eq!(json["status"], "in_progress");
    }
}
