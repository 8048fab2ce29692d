//! OnboardingEngine - drives one wizard session through its flow.
//!
//! The engine exclusively owns the `OnboardingSession`. Every mutation goes
//! through `update_data`, `set_step_valid`, `next`, `previous`,
//! `go_to_step`, and `complete`. Business outcomes are returned as
//! [`Outcome`] values and never as errors: a precondition that does not
//! hold is a `Blocked` no-op, and a remote rejection is a `Failed` outcome
//! mirrored into `session.error` for the caller to display and retry.
//!
//! Session state sits behind a short-lived mutex that is never held across
//! an `.await`. Only `next` and `complete` suspend, and they are the only
//! places where `is_loading` is observably true.
//!
//! After `unmount` a remote result no longer touches the session, but a
//! successful one is still written to local storage: a save records the
//! next step, a completion clears saved progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::foundation::{
    DomainError, ErrorCode, StateMachine, Timestamp, ValidationError,
};
use crate::domain::onboarding::{
    BlockReason, ExternalEventGate, FlowDefinition, FlowProgress, FlowVariant, GatingBridge,
    NavigationPolicy, OnboardingData, OnboardingSession, Outcome, SessionStatus, StepContract,
    StepSink, APPLICATION_FEE_GATE,
};
use crate::ports::{CompleteRequest, SaveProgressRequest};

use super::persistence::PersistenceAdapter;

/// Mutable engine state guarded by one lock.
#[derive(Debug)]
struct EngineState {
    session: OnboardingSession,
    /// Remote calls currently awaiting a response.
    in_flight: u32,
}

impl EngineState {
    fn begin_submission(&mut self) {
        self.in_flight += 1;
        self.session.is_loading = true;
    }

    fn end_submission(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.session.is_loading = self.in_flight > 0;
    }
}

/// Controller for one onboarding wizard.
pub struct OnboardingEngine {
    flow: FlowDefinition,
    policy: NavigationPolicy,
    persistence: PersistenceAdapter,
    state: Mutex<EngineState>,
    gates: Vec<(usize, Arc<ExternalEventGate>)>,
    mounted: AtomicBool,
}

impl OnboardingEngine {
    /// Mounts the standard flow for `variant` with the default policy,
    /// rehydrating any saved local progress.
    pub fn mount(variant: FlowVariant, persistence: PersistenceAdapter) -> Self {
        Self::mount_with(
            FlowDefinition::for_variant(variant),
            persistence,
            NavigationPolicy::default(),
        )
    }

    pub fn mount_with(
        flow: FlowDefinition,
        persistence: PersistenceAdapter,
        policy: NavigationPolicy,
    ) -> Self {
        let variant = flow.variant();
        let session = match persistence.load(variant) {
            Some(progress) => {
                let saved_index = progress.current_step_index;
                let session = OnboardingSession::rehydrated(&flow, progress);
                if session.current_step_index != saved_index {
                    tracing::warn!(
                        %variant,
                        saved_index,
                        step = session.current_step_index,
                        "Saved step index outside flow, clamped"
                    );
                }
                session
            }
            None => OnboardingSession::new(variant),
        };

        let gates: Vec<_> = flow
            .gated_steps()
            .map(|(index, gating)| (index, Arc::new(ExternalEventGate::new(gating))))
            .collect();
        for (_, gate) in &gates {
            gate.observe_data(&session.data);
        }

        tracing::info!(
            %variant,
            session_id = %session.id,
            step = session.current_step_index,
            total_steps = flow.total_steps(),
            "Onboarding engine mounted"
        );

        Self {
            flow,
            policy,
            persistence,
            state: Mutex::new(EngineState {
                session,
                in_flight: 0,
            }),
            gates,
            mounted: AtomicBool::new(true),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Step-facing operations
    // ─────────────────────────────────────────────────────────────────────

    /// Shallow-merges `partial` into session data and writes the result
    /// through to local storage.
    pub fn update_data(&self, partial: OnboardingData) {
        let mut state = self.lock();
        if state.session.is_completed() {
            tracing::debug!(variant = %self.variant(), "Ignoring data update on completed session");
            return;
        }

        state.session.data.merge(partial);
        for (_, gate) in &self.gates {
            gate.observe_data(&state.session.data);
        }
        self.persist_locally(&state.session);
    }

    /// Overwrites the current step's validity. Never debounced.
    pub fn set_step_valid(&self, valid: bool) {
        self.lock().session.is_current_step_valid = valid;
    }

    /// Runs `step` against the current data, giving it this engine as
    /// its sink.
    pub fn render(&self, step: &mut dyn StepContract) {
        let data = self.data();
        step.on_change(&data, self);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────

    /// Saves progress remotely and advances one step.
    ///
    /// Blocked unless the current step is valid and any gate on it is
    /// satisfied. The index only moves after the remote save resolves.
    pub async fn next(&self) -> Outcome {
        let (request, from) = {
            let mut state = self.lock();
            if let Err(reason) = self.check_next(&state) {
                return self.blocked("next", &state.session, reason);
            }

            let from = state.session.current_step_index;
            if let Some(gate) = self.gate_at(from) {
                state.session.data.insert(gate.satisfied_flag(), true);
            }
            state.begin_submission();

            let request = SaveProgressRequest {
                variant: self.variant(),
                step: from,
                data: state.session.data.clone(),
            };
            (request, from)
        };

        let result = self.persistence.remote_save_progress(&request).await;

        let mut state = self.lock();
        if !self.is_mounted() {
            tracing::debug!(variant = %self.variant(), step = from, "Save resolved after unmount");
            if result.is_ok() {
                let to = self.flow.clamp_index(from + 1);
                self.persistence.save(request.variant, &request.data, to);
            }
            return Outcome::Detached;
        }
        state.end_submission();

        match result {
            Ok(()) => {
                let to = self.flow.clamp_index(from + 1);
                let session = &mut state.session;
                session.current_step_index = to;
                session.is_current_step_valid = false;
                session.error = None;
                session.last_saved_at = Some(Timestamp::now());
                self.persist_locally(session);

                tracing::info!(
                    variant = %self.variant(),
                    session_id = %session.id,
                    from,
                    to,
                    "Onboarding step advanced"
                );
                Outcome::Advanced { from, to }
            }
            Err(e) => {
                tracing::warn!(
                    variant = %self.variant(),
                    session_id = %state.session.id,
                    step = from,
                    error = %e,
                    "Remote save failed"
                );
                let error = DomainError::new(
                    ErrorCode::RemoteSaveFailed,
                    format!("Failed to save progress: {}", e),
                )
                .with_detail("step", from.to_string())
                .with_detail("retryable", e.is_retryable().to_string());
                self.fail(&mut state.session, error)
            }
        }
    }

    /// Moves back one step. Validity of the revisited step follows the
    /// navigation policy.
    pub fn previous(&self) -> Outcome {
        let mut state = self.lock();
        if state.session.is_completed() {
            return self.blocked("previous", &state.session, BlockReason::SessionCompleted);
        }

        let from = state.session.current_step_index;
        let Some(to) = self.flow.previous_index(from) else {
            return self.blocked("previous", &state.session, BlockReason::AtFirstStep);
        };

        state.session.current_step_index = to;
        state.session.is_current_step_valid = self.policy.validity_on_back_navigation();
        self.persist_locally(&state.session);

        tracing::debug!(variant = %self.variant(), from, to, "Moved to previous step");
        Outcome::Moved { from, to }
    }

    /// Jumps to `index`. Validity is left for the target step to recompute.
    pub fn go_to_step(&self, index: usize) -> Outcome {
        let mut state = self.lock();
        if state.session.is_completed() {
            return self.blocked("go_to_step", &state.session, BlockReason::SessionCompleted);
        }
        if !self.flow.contains_index(index) {
            let reason = BlockReason::StepOutOfRange {
                requested: index,
                total: self.flow.total_steps(),
            };
            return self.blocked("go_to_step", &state.session, reason);
        }

        let from = state.session.current_step_index;
        state.session.current_step_index = index;
        self.persist_locally(&state.session);

        tracing::debug!(variant = %self.variant(), from, to = index, "Jumped to step");
        Outcome::Moved { from, to: index }
    }

    /// Submits the full data set from the last step. On success local
    /// progress is cleared and the session becomes terminal.
    pub async fn complete(&self) -> Outcome {
        let request = {
            let mut state = self.lock();
            if let Err(reason) = self.check_complete(&state) {
                return self.blocked("complete", &state.session, reason);
            }
            state.begin_submission();
            CompleteRequest {
                variant: self.variant(),
                data: state.session.data.clone(),
            }
        };

        let result = self.persistence.remote_complete(&request).await;

        let mut state = self.lock();
        if !self.is_mounted() {
            tracing::debug!(variant = %self.variant(), "Completion resolved after unmount");
            if result.is_ok() {
                self.persistence.clear(request.variant);
            }
            return Outcome::Detached;
        }
        state.end_submission();

        match result {
            Ok(()) => match state.session.status.transition_to(SessionStatus::Completed) {
                Ok(status) => {
                    let session = &mut state.session;
                    session.status = status;
                    session.error = None;
                    session.last_saved_at = Some(Timestamp::now());
                    self.persistence.clear(self.variant());

                    tracing::info!(
                        variant = %self.variant(),
                        session_id = %session.id,
                        "Onboarding completed"
                    );
                    Outcome::Completed
                }
                // A concurrent completion got there first.
                Err(e) => self.fail(&mut state.session, DomainError::from(e)),
            },
            Err(e) => {
                tracing::warn!(
                    variant = %self.variant(),
                    session_id = %state.session.id,
                    error = %e,
                    "Remote completion failed"
                );
                let error = DomainError::new(
                    ErrorCode::RemoteCompleteFailed,
                    format!("Failed to complete onboarding: {}", e),
                )
                .with_detail("retryable", e.is_retryable().to_string());
                self.fail(&mut state.session, error)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gating
    // ─────────────────────────────────────────────────────────────────────

    /// The bridge for the gate on step `index`, if that step is gated.
    pub fn gate(&self, index: usize) -> Option<Arc<dyn GatingBridge>> {
        self.gate_at(index).map(|gate| gate as Arc<dyn GatingBridge>)
    }

    /// The application-fee gate of the coach flow.
    pub fn payment_gate(&self) -> Option<Arc<ExternalEventGate>> {
        self.gates
            .iter()
            .find(|(_, gate)| gate.gating() == APPLICATION_FEE_GATE)
            .map(|(_, gate)| Arc::clone(gate))
    }

    /// Routes a named external event with a JSON body to the gate
    /// listening for it. Returns whether that gate is now satisfied;
    /// events no gate listens for are ignored.
    pub fn deliver_event(&self, event: &str, payload: &str) -> Result<bool, ValidationError> {
        let Some((_, gate)) = self.gates.iter().find(|(_, g)| g.event_name() == event) else {
            tracing::debug!(variant = %self.variant(), event, "No gate listens for event");
            return Ok(false);
        };
        gate.receive_json(payload)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle and queries
    // ─────────────────────────────────────────────────────────────────────

    /// Detaches the engine from its view. Remote calls already in flight
    /// still resolve, but their results are dropped.
    pub fn unmount(&self) {
        if self.mounted.swap(false, Ordering::SeqCst) {
            tracing::debug!(variant = %self.variant(), "Onboarding engine unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub fn clear_error(&self) {
        self.lock().session.error = None;
    }

    pub fn variant(&self) -> FlowVariant {
        self.flow.variant()
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn policy(&self) -> NavigationPolicy {
        self.policy
    }

    /// Snapshot of the whole session.
    pub fn session(&self) -> OnboardingSession {
        self.lock().session.clone()
    }

    pub fn data(&self) -> OnboardingData {
        self.lock().session.data.clone()
    }

    pub fn current_step_index(&self) -> usize {
        self.lock().session.current_step_index
    }

    pub fn is_current_step_valid(&self) -> bool {
        self.lock().session.is_current_step_valid
    }

    pub fn is_loading(&self) -> bool {
        self.lock().session.is_loading
    }

    pub fn is_completed(&self) -> bool {
        self.lock().session.is_completed()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().session.error.clone()
    }

    pub fn progress(&self) -> FlowProgress {
        let state = self.lock();
        let index = state.session.current_step_index;
        let gate_satisfied = self.gate_at(index).map(|gate| gate.is_satisfied());
        FlowProgress::new(&self.flow, &state.session, gate_satisfied)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate_at(&self, index: usize) -> Option<Arc<ExternalEventGate>> {
        self.gates
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, gate)| Arc::clone(gate))
    }

    fn check_submission(&self, state: &EngineState) -> Result<(), BlockReason> {
        if state.session.is_completed() {
            return Err(BlockReason::SessionCompleted);
        }
        if self.policy.reject_reentrant_submissions && state.in_flight > 0 {
            return Err(BlockReason::SubmissionInFlight);
        }
        Ok(())
    }

    fn check_current_step(&self, state: &EngineState) -> Result<(), BlockReason> {
        let index = state.session.current_step_index;
        if !state.session.is_current_step_valid {
            return Err(BlockReason::StepInvalid);
        }
        match self.gate_at(index) {
            Some(gate) if !gate.is_satisfied() => Err(BlockReason::GateNotSatisfied),
            _ => Ok(()),
        }
    }

    fn check_next(&self, state: &EngineState) -> Result<(), BlockReason> {
        self.check_submission(state)?;
        if self.flow.is_last(state.session.current_step_index) {
            return Err(BlockReason::AtLastStep);
        }
        self.check_current_step(state)
    }

    fn check_complete(&self, state: &EngineState) -> Result<(), BlockReason> {
        self.check_submission(state)?;
        if !self.flow.is_last(state.session.current_step_index) {
            return Err(BlockReason::NotAtLastStep);
        }
        self.check_current_step(state)
    }

    fn blocked(
        &self,
        operation: &'static str,
        session: &OnboardingSession,
        reason: BlockReason,
    ) -> Outcome {
        tracing::debug!(
            variant = %self.variant(),
            session_id = %session.id,
            step = session.current_step_index,
            operation,
            code = %reason.code(),
            "Onboarding operation blocked: {}",
            reason
        );
        Outcome::Blocked(reason)
    }

    fn fail(&self, session: &mut OnboardingSession, error: DomainError) -> Outcome {
        session.error = Some(error.message.clone());
        Outcome::Failed { error }
    }

    fn persist_locally(&self, session: &OnboardingSession) {
        self.persistence
            .save(session.variant, &session.data, session.current_step_index);
    }
}

impl StepSink for OnboardingEngine {
    fn set_step_valid(&self, valid: bool) {
        OnboardingEngine::set_step_valid(self, valid);
    }

    fn update_data(&self, partial: OnboardingData) {
        OnboardingEngine::update_data(self, partial);
    }
}

impl std::fmt::Debug for OnboardingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnboardingEngine")
            .field("flow", &self.flow)
            .field("policy", &self.policy)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLocalStore, MockOnboardingApi};
    use crate::domain::onboarding::{GatingSignal, RequiredFields, StepDescriptor};
    use crate::ports::{ApiError, LocalStore};
    use proptest::prelude::*;
    use serde_json::json;

    struct Harness {
        store: InMemoryLocalStore,
        api: MockOnboardingApi,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: InMemoryLocalStore::new(),
                api: MockOnboardingApi::new(),
            }
        }

        fn persistence(&self) -> PersistenceAdapter {
            PersistenceAdapter::new(Arc::new(self.store.clone()), Arc::new(self.api.clone()))
        }

        fn mount(&self, variant: FlowVariant) -> OnboardingEngine {
            OnboardingEngine::mount(variant, self.persistence())
        }

        fn mount_with_policy(
            &self,
            variant: FlowVariant,
            policy: NavigationPolicy,
        ) -> OnboardingEngine {
            let flow = FlowDefinition::for_variant(variant);
            OnboardingEngine::mount_with(flow, self.persistence(), policy)
        }
    }

    async fn advance_to(engine: &OnboardingEngine, index: usize) {
        while engine.current_step_index() < index {
            engine.set_step_valid(true);
            assert!(matches!(engine.next().await, Outcome::Advanced { .. }));
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mounting
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn fresh_mount_starts_at_first_step() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);

        assert_eq!(engine.current_step_index(), 0);
        assert!(!engine.is_current_step_valid());
        assert!(!engine.is_loading());
        assert!(engine.data().is_empty());
        assert_eq!(engine.flow().total_steps(), 8);
    }

    #[test]
    fn mount_clamps_saved_index_into_flow() {
        let h = Harness::new();
        h.store.set("onboarding_coach_step", "12").unwrap();

        let engine = h.mount(FlowVariant::Coach);
        assert_eq!(engine.current_step_index(), 6);
    }

    #[test]
    fn mount_satisfies_gate_from_saved_flag() {
        let h = Harness::new();
        h.store
            .set("onboarding_coach_data", r#"{"applicationFeePaid":true}"#)
            .unwrap();
        h.store.set("onboarding_coach_step", "1").unwrap();

        let engine = h.mount(FlowVariant::Coach);
        assert!(engine.payment_gate().unwrap().is_satisfied());
    }

    #[test]
    fn client_flow_has_no_gates() {
        let engine = Harness::new().mount(FlowVariant::Client);
        assert!(engine.payment_gate().is_none());
        assert!((0..8).all(|i| engine.gate(i).is_none()));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Data and validity
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn update_data_merges_and_writes_through_locally() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);

        engine.update_data(OnboardingData::new().with("firstName", "Ana"));
        engine.update_data(OnboardingData::new().with("lastName", "Silva"));

        let saved = h.persistence().load(FlowVariant::Client).unwrap();
        assert_eq!(saved.data.get_str("firstName"), Some("Ana"));
        assert_eq!(saved.data.get_str("lastName"), Some("Silva"));
        assert_eq!(h.api.save_count(), 0);
    }

    #[test]
    fn update_data_has_no_validity_side_effect() {
        let engine = Harness::new().mount(FlowVariant::Client);
        engine.set_step_valid(true);
        engine.update_data(OnboardingData::new().with("x", 1));
        assert!(engine.is_current_step_valid());
    }

    #[test]
    fn update_data_survives_local_write_failure() {
        let h = Harness::new();
        h.store.set_fail_writes(true);
        let engine = h.mount(FlowVariant::Client);

        engine.update_data(OnboardingData::new().with("firstName", "Ana"));

        assert_eq!(engine.data().get_str("firstName"), Some("Ana"));
        assert!(h.store.is_empty());
    }

    #[test]
    fn set_step_valid_accepts_rapid_toggling() {
        let engine = Harness::new().mount(FlowVariant::Client);
        for i in 0..10 {
            engine.set_step_valid(i % 2 == 0);
        }
        assert!(!engine.is_current_step_valid());
        engine.set_step_valid(true);
        assert!(engine.is_current_step_valid());
    }

    #[test]
    fn render_lets_step_report_validity() {
        let engine = Harness::new().mount(FlowVariant::Client);
        let mut step = RequiredFields::new(["firstName", "email"]);

        engine.render(&mut step);
        assert!(!engine.is_current_step_valid());

        engine.update_data(
            OnboardingData::new()
                .with("firstName", "Ana")
                .with("email", "ana@example.com"),
        );
        engine.render(&mut step);
        assert!(engine.is_current_step_valid());
    }

    // ─────────────────────────────────────────────────────────────────────
    // next()
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn next_blocked_while_step_invalid() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);

        let outcome = engine.next().await;

        assert_eq!(outcome, Outcome::Blocked(BlockReason::StepInvalid));
        assert_eq!(engine.current_step_index(), 0);
        assert_eq!(h.api.save_count(), 0);
    }

    #[tokio::test]
    async fn next_saves_remotely_then_advances() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.update_data(OnboardingData::new().with("firstName", "Ana"));
        engine.set_step_valid(true);

        let outcome = engine.next().await;

        assert_eq!(outcome, Outcome::Advanced { from: 0, to: 1 });
        let requests = h.api.save_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].variant, FlowVariant::Client);
        assert_eq!(requests[0].step, 0);
        assert_eq!(requests[0].data.get_str("firstName"), Some("Ana"));

        assert_eq!(engine.current_step_index(), 1);
        assert!(!engine.is_current_step_valid());
        assert!(!engine.is_loading());
        assert!(engine.session().last_saved_at.is_some());
        assert_eq!(h.persistence().load(FlowVariant::Client).unwrap().current_step_index, 1);
    }

    #[tokio::test]
    async fn next_failure_keeps_index_and_sets_error() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.set_step_valid(true);
        h.api.fail_next_save(ApiError::Status {
            status: 503,
            body: "unavailable".to_string(),
        });

        let outcome = engine.next().await;

        match outcome {
            Outcome::Failed { error } => {
                assert_eq!(error.code, ErrorCode::RemoteSaveFailed);
                assert_eq!(error.details.get("retryable").map(String::as_str), Some("true"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(engine.current_step_index(), 0);
        assert!(engine.error().is_some());
        assert!(!engine.is_loading());
        assert!(engine.is_current_step_valid());
    }

    #[tokio::test]
    async fn retry_after_failure_advances_and_clears_error() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.set_step_valid(true);
        h.api.fail_next_save(ApiError::Timeout);

        assert!(engine.next().await.is_failed());
        assert_eq!(engine.next().await, Outcome::Advanced { from: 0, to: 1 });
        assert!(engine.error().is_none());
        assert_eq!(h.api.save_count(), 2);
    }

    #[tokio::test]
    async fn next_blocked_on_last_step() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.go_to_step(7);
        engine.set_step_valid(true);

        assert_eq!(engine.next().await, Outcome::Blocked(BlockReason::AtLastStep));
        assert_eq!(h.api.save_count(), 0);
    }

    #[tokio::test]
    async fn next_on_gated_step_waits_for_gate() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Coach);
        advance_to(&engine, 1).await;
        engine.set_step_valid(true);

        assert_eq!(engine.next().await, Outcome::Blocked(BlockReason::GateNotSatisfied));
        assert_eq!(engine.current_step_index(), 1);

        engine.payment_gate().unwrap().receive(GatingSignal::paid());
        assert_eq!(engine.next().await, Outcome::Advanced { from: 1, to: 2 });
    }

    #[tokio::test]
    async fn leaving_gated_step_records_flag_in_data() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Coach);
        advance_to(&engine, 1).await;
        engine.gate(1).unwrap().report_satisfied();
        engine.set_step_valid(true);

        engine.next().await;

        let last = h.api.save_requests().pop().unwrap();
        assert_eq!(last.data.get("applicationFeePaid"), Some(&json!(true)));
        assert!(engine.data().is_flag_set("applicationFeePaid"));
    }

    // ─────────────────────────────────────────────────────────────────────
    // previous() / go_to_step()
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn previous_blocked_at_first_step() {
        let engine = Harness::new().mount(FlowVariant::Client);
        assert_eq!(engine.previous(), Outcome::Blocked(BlockReason::AtFirstStep));
    }

    #[tokio::test]
    async fn previous_trusts_revisited_step_by_default() {
        let engine = Harness::new().mount(FlowVariant::Client);
        advance_to(&engine, 2).await;
        assert!(!engine.is_current_step_valid());

        assert_eq!(engine.previous(), Outcome::Moved { from: 2, to: 1 });
        assert!(engine.is_current_step_valid());
    }

    #[tokio::test]
    async fn previous_can_require_revalidation() {
        let h = Harness::new();
        let policy = NavigationPolicy {
            trust_previous_steps: false,
            ..NavigationPolicy::default()
        };
        let engine = h.mount_with_policy(FlowVariant::Client, policy);
        advance_to(&engine, 2).await;
        engine.set_step_valid(true);

        engine.previous();
        assert!(!engine.is_current_step_valid());
    }

    #[test]
    fn go_to_step_leaves_validity_untouched() {
        let engine = Harness::new().mount(FlowVariant::Client);
        engine.set_step_valid(true);

        assert_eq!(engine.go_to_step(4), Outcome::Moved { from: 0, to: 4 });
        assert!(engine.is_current_step_valid());

        engine.set_step_valid(false);
        engine.go_to_step(2);
        assert!(!engine.is_current_step_valid());
    }

    #[test]
    fn go_to_step_rejects_out_of_range() {
        let engine = Harness::new().mount(FlowVariant::Coach);
        assert_eq!(
            engine.go_to_step(7),
            Outcome::Blocked(BlockReason::StepOutOfRange { requested: 7, total: 7 })
        );
        assert_eq!(engine.current_step_index(), 0);
    }

    #[test]
    fn navigation_writes_index_locally() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.go_to_step(5);
        engine.previous();

        assert_eq!(h.persistence().load(FlowVariant::Client).unwrap().current_step_index, 4);
    }

    // ─────────────────────────────────────────────────────────────────────
    // complete()
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn complete_requires_last_step() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.set_step_valid(true);

        assert_eq!(engine.complete().await, Outcome::Blocked(BlockReason::NotAtLastStep));
        assert_eq!(h.api.complete_count(), 0);
    }

    #[tokio::test]
    async fn complete_requires_valid_last_step() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.go_to_step(7);

        assert_eq!(engine.complete().await, Outcome::Blocked(BlockReason::StepInvalid));
    }

    #[tokio::test]
    async fn complete_submits_data_and_clears_local_state() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.update_data(OnboardingData::new().with("firstName", "Ana"));
        engine.go_to_step(7);
        engine.set_step_valid(true);

        assert_eq!(engine.complete().await, Outcome::Completed);

        let requests = h.api.complete_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].data.get_str("firstName"), Some("Ana"));
        assert!(engine.is_completed());
        assert!(h.store.is_empty());
        assert_eq!(h.persistence().load(FlowVariant::Client), None);
    }

    #[tokio::test]
    async fn complete_failure_leaves_state_for_retry() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.update_data(OnboardingData::new().with("firstName", "Ana"));
        engine.go_to_step(7);
        engine.set_step_valid(true);
        h.api.fail_next_complete(ApiError::Rejected("duplicate".to_string()));

        let outcome = engine.complete().await;

        assert!(outcome.is_failed());
        assert!(!engine.is_completed());
        assert!(engine.error().is_some());
        assert!(!engine.is_loading());
        assert!(h.persistence().load(FlowVariant::Client).is_some());

        assert_eq!(engine.complete().await, Outcome::Completed);
    }

    #[tokio::test]
    async fn completed_session_blocks_further_operations() {
        let h = Harness::new();
        let engine = h.mount(FlowVariant::Client);
        engine.go_to_step(7);
        engine.set_step_valid(true);
        engine.complete().await;

        assert_eq!(engine.complete().await, Outcome::Blocked(BlockReason::SessionCompleted));
        assert_eq!(engine.previous(), Outcome::Blocked(BlockReason::SessionCompleted));
        assert_eq!(engine.go_to_step(0), Outcome::Blocked(BlockReason::SessionCompleted));

        engine.update_data(OnboardingData::new().with("late", true));
        assert!(h.store.is_empty());
        assert_eq!(h.api.complete_count(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gating events and progress
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn deliver_event_routes_by_event_name() {
        let engine = Harness::new().mount(FlowVariant::Coach);

        assert_eq!(engine.deliver_event("somethingElse", r#"{"paid":true}"#), Ok(false));
        assert!(!engine.payment_gate().unwrap().is_satisfied());

        assert_eq!(engine.deliver_event("coachPaymentComplete", r#"{"paid":true}"#), Ok(true));
        assert!(engine.payment_gate().unwrap().is_satisfied());
    }

    #[test]
    fn deliver_event_rejects_malformed_payload() {
        let engine = Harness::new().mount(FlowVariant::Coach);
        assert!(engine.deliver_event("coachPaymentComplete", "not json").is_err());
    }

    #[test]
    fn update_data_with_flag_satisfies_gate() {
        let engine = Harness::new().mount(FlowVariant::Coach);
        engine.update_data(OnboardingData::new().with("applicationFeePaid", true));
        assert!(engine.payment_gate().unwrap().is_satisfied());
    }

    #[tokio::test]
    async fn progress_reports_gate_only_on_gated_step() {
        let engine = Harness::new().mount(FlowVariant::Coach);
        assert_eq!(engine.progress().gate_satisfied, None);

        advance_to(&engine, 1).await;
        let progress = engine.progress();
        assert_eq!(progress.gate_satisfied, Some(false));
        assert_eq!(progress.current_title, "Application Fee");
        assert_eq!(progress.step_label(), "Step 2 of 7");
    }

    #[test]
    fn custom_flow_gates_are_built_from_descriptors() {
        let h = Harness::new();
        let flow = FlowDefinition::custom(
            FlowVariant::Coach,
            vec![
                StepDescriptor::new("Intro"),
                StepDescriptor::gated("Pay", APPLICATION_FEE_GATE),
            ],
        )
        .unwrap();
        let engine =
            OnboardingEngine::mount_with(flow, h.persistence(), NavigationPolicy::default());

        assert!(engine.gate(0).is_none());
        assert!(engine.gate(1).is_some());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Properties
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Debug, Clone)]
    enum Op {
        Valid(bool),
        Next,
        Previous,
        GoTo(usize),
        Pay,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<bool>().prop_map(Op::Valid),
            Just(Op::Next),
            Just(Op::Previous),
            (0usize..12).prop_map(Op::GoTo),
            Just(Op::Pay),
        ]
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn index_stays_within_flow(
            coach in any::<bool>(),
            ops in prop::collection::vec(op_strategy(), 0..40),
        ) {
            let variant = if coach { FlowVariant::Coach } else { FlowVariant::Client };
            let h = Harness::new();
            let engine = h.mount(variant);
            let total = engine.flow().total_steps();
            let rt = runtime();

            for op in ops {
                match op {
                    Op::Valid(v) => engine.set_step_valid(v),
                    Op::Next => { rt.block_on(engine.next()); }
                    Op::Previous => { engine.previous(); }
                    Op::GoTo(i) => { engine.go_to_step(i); }
                    Op::Pay => {
                        if let Some(gate) = engine.payment_gate() {
                            gate.report_satisfied();
                        }
                    }
                }
                prop_assert!(engine.current_step_index() < total);
            }
        }

        #[test]
        fn later_updates_win_and_disjoint_keys_accumulate(
            first in prop::collection::btree_map("[a-e]", any::<i32>(), 0..5),
            second in prop::collection::btree_map("[c-h]", any::<i32>(), 0..5),
        ) {
            let engine = Harness::new().mount(FlowVariant::Client);
            engine.update_data(first.iter().map(|(k, v)| (k.clone(), json!(v))).collect());
            engine.update_data(second.iter().map(|(k, v)| (k.clone(), json!(v))).collect());

            let data = engine.data();
            for (key, value) in &first {
                if !second.contains_key(key) {
                    prop_assert_eq!(data.get(key), Some(&json!(value)));
                }
            }
            for (key, value) in &second {
                prop_assert_eq!(data.get(key), Some(&json!(value)));
            }
            let union: std::collections::BTreeSet<_> = first.keys().chain(second.keys()).collect();
            prop_assert_eq!(data.len(), union.len());
        }
    }
}
