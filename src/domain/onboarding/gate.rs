//! GatingBridge - the narrow channel by which an embedded sub-flow (the
//! coach application-fee payment) tells the engine its gate is satisfied.
//!
//! The engine only ever reads a gate. The payment collaborator only ever
//! calls `report_satisfied()` (or hands over the raw `coachPaymentComplete`
//! event). Neither knows anything else about the other.
//!
//! ## Satisfaction paths
//!
//! - Live signal: `{ "paid": true }` from the payment sub-flow.
//! - Resume: `data.<satisfied_flag> == true` from a previous session, where
//!   the live signal will never fire again.
//!
//! Once satisfied a gate stays satisfied for the life of the session. There
//! is deliberately no way to re-arm it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::data::OnboardingData;
use super::step::GatingKind;
use crate::domain::foundation::ValidationError;

/// Observable state of one gated step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GateState {
    pub satisfied: bool,
}

/// Payload of the gating event emitted by the payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatingSignal {
    pub paid: bool,
}

impl GatingSignal {
    pub fn paid() -> Self {
        Self { paid: true }
    }

    /// Decodes the event body, e.g. `{"paid": true}`.
    pub fn from_json(payload: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(payload)
            .map_err(|e| ValidationError::invalid_format("gating_signal", e.to_string()))
    }
}

/// Port through which a sub-flow reports completion.
///
/// Implementations must be idempotent: repeated reports are not errors.
pub trait GatingBridge: Send + Sync {
    /// Marks the gate satisfied. A no-op if it already is.
    fn report_satisfied(&self);

    /// Current gate state.
    fn state(&self) -> GateState;

    fn is_satisfied(&self) -> bool {
        self.state().satisfied
    }
}

/// Gate for an `ExternalEvent` step.
#[derive(Debug)]
pub struct ExternalEventGate {
    gating: GatingKind,
    satisfied: AtomicBool,
    deliveries: AtomicU32,
}

impl ExternalEventGate {
    /// A new, unsatisfied gate.
    pub fn new(gating: GatingKind) -> Self {
        Self {
            gating,
            satisfied: AtomicBool::new(false),
            deliveries: AtomicU32::new(0),
        }
    }

    pub fn gating(&self) -> GatingKind {
        self.gating
    }

    pub fn event_name(&self) -> &'static str {
        self.gating.event()
    }

    pub fn satisfied_flag(&self) -> &'static str {
        self.gating.satisfied_flag()
    }

    /// Handles one delivery of the gating event.
    ///
    /// Returns whether the gate is satisfied afterwards. `paid: false`
    /// leaves the gate untouched.
    pub fn receive(&self, signal: GatingSignal) -> bool {
        if signal.paid {
            self.report_satisfied();
        } else {
            tracing::debug!(
                event = self.event_name(),
                "Ignoring gating signal without payment confirmation"
            );
        }
        self.is_satisfied()
    }

    /// Decodes and handles a raw event body.
    pub fn receive_json(&self, payload: &str) -> Result<bool, ValidationError> {
        let signal = GatingSignal::from_json(payload)?;
        Ok(self.receive(signal))
    }

    /// Satisfies the gate from persisted data, if the flag is set there.
    pub fn observe_data(&self, data: &OnboardingData) -> bool {
        if data.is_flag_set(self.satisfied_flag()) && !self.is_satisfied() {
            self.satisfied.store(true, Ordering::SeqCst);
            tracing::debug!(
                flag = self.satisfied_flag(),
                "Gate satisfied from persisted data"
            );
        }
        self.is_satisfied()
    }

    /// How many times `report_satisfied` has been called, duplicates included.
    pub fn deliveries(&self) -> u32 {
        self.deliveries.load(Ordering::SeqCst)
    }
}

impl GatingBridge for ExternalEventGate {
    fn report_satisfied(&self) {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        let was_satisfied = self.satisfied.swap(true, Ordering::SeqCst);
        if was_satisfied {
            tracing::debug!(event = self.event_name(), "Duplicate gating signal ignored");
        } else {
            tracing::info!(event = self.event_name(), "Gate satisfied");
        }
    }

    fn state(&self) -> GateState {
        GateState {
            satisfied: self.satisfied.load(Ordering::SeqCst),
        }
    }
}
