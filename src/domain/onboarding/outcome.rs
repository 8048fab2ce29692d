//! Results of engine operations.
//!
//! Business outcomes are values, not errors: a blocked `next()` is a
//! no-op the UI can inspect, and a failed remote save is reported here and
//! in `session.error` rather than thrown.

use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Why an operation's preconditions were not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// The current step has not reported itself valid.
    StepInvalid,
    /// The current step is gated and its gate has not been satisfied.
    GateNotSatisfied,
    /// `previous()` on the first step.
    AtFirstStep,
    /// `next()` on the last step; use `complete()` instead.
    AtLastStep,
    /// `complete()` before reaching the last step.
    NotAtLastStep,
    /// `go_to_step()` with an index outside the flow.
    StepOutOfRange { requested: usize, total: usize },
    /// A `next()`/`complete()` is already awaiting the remote service.
    SubmissionInFlight,
    /// The session was already completed.
    SessionCompleted,
}

impl BlockReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            BlockReason::StepInvalid => ErrorCode::StepInvalid,
            BlockReason::GateNotSatisfied => ErrorCode::GateNotSatisfied,
            BlockReason::AtFirstStep => ErrorCode::AtFirstStep,
            BlockReason::AtLastStep => ErrorCode::AtLastStep,
            BlockReason::NotAtLastStep => ErrorCode::NotAtLastStep,
            BlockReason::StepOutOfRange { .. } => ErrorCode::StepOutOfRange,
            BlockReason::SubmissionInFlight => ErrorCode::SubmissionInFlight,
            BlockReason::SessionCompleted => ErrorCode::SessionCompleted,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::StepInvalid => write!(f, "current step is not valid"),
            BlockReason::GateNotSatisfied => write!(f, "current step is waiting on its gate"),
            BlockReason::AtFirstStep => write!(f, "already at the first step"),
            BlockReason::AtLastStep => write!(f, "already at the last step"),
            BlockReason::NotAtLastStep => write!(f, "not at the last step"),
            BlockReason::StepOutOfRange { requested, total } => {
                write!(f, "step {} is outside a flow of {} steps", requested, total)
            }
            BlockReason::SubmissionInFlight => write!(f, "a submission is already in flight"),
            BlockReason::SessionCompleted => write!(f, "session already completed"),
        }
    }
}

/// What an engine operation did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// `next()` saved remotely and moved forward.
    Advanced { from: usize, to: usize },
    /// `previous()`/`go_to_step()` moved the cursor.
    Moved { from: usize, to: usize },
    /// `complete()` succeeded and local progress was cleared.
    Completed,
    /// Preconditions unmet; nothing changed.
    Blocked(BlockReason),
    /// The remote call failed; state is untouched and the call may be retried.
    Failed { error: DomainError },
    /// The engine was unmounted while the remote call was in flight; its
    /// result was not applied.
    Detached,
}

impl Outcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Outcome::Blocked(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn block_reason(&self) -> Option<BlockReason> {
        match self {
            Outcome::Blocked(reason) => Some(*reason),
            _ => None,
        }
    }
}
