//! FlowDefinition - ordered step lists for each onboarding variant.
//!
//! All ordering questions (how many steps, which one is last, which one is
//! gated, where does `next` land) go through this type so the engine never
//! does index arithmetic against a hard-coded count.
//!
//! # Client flow (8 steps)
//!
//! 1. Welcome → 2. Personal Information → 3. Health History →
//! 4. Wellness Goals → 5. Lifestyle & Habits → 6. Coaching Preferences →
//! 7. Emergency Contact → 8. Review & Submit
//!
//! # Coach flow (7 steps)
//!
//! 1. Personal Information → 2. Application Fee (gated) →
//! 3. Professional Background → 4. Certifications →
//! 5. Specialties & Approach → 6. Availability & Rates → 7. Review & Submit

use serde::Serialize;

use super::step::{GatingKind, StepDescriptor};
use super::variant::FlowVariant;
use crate::domain::foundation::ValidationError;

/// Gate on the coach application fee step.
pub const APPLICATION_FEE_GATE: GatingKind = GatingKind::ExternalEvent {
    event: "coachPaymentComplete",
    satisfied_flag: "applicationFeePaid",
};

pub const CLIENT_STEPS: [StepDescriptor; 8] = [
    StepDescriptor::new("Welcome"),
    StepDescriptor::new("Personal Information"),
    StepDescriptor::new("Health History"),
    StepDescriptor::new("Wellness Goals"),
    StepDescriptor::new("Lifestyle & Habits"),
    StepDescriptor::new("Coaching Preferences"),
    StepDescriptor::new("Emergency Contact"),
    StepDescriptor::new("Review & Submit"),
];

pub const COACH_STEPS: [StepDescriptor; 7] = [
    StepDescriptor::new("Personal Information"),
    StepDescriptor::gated("Application Fee", APPLICATION_FEE_GATE),
    StepDescriptor::new("Professional Background"),
    StepDescriptor::new("Certifications"),
    StepDescriptor::new("Specialties & Approach"),
    StepDescriptor::new("Availability & Rates"),
    StepDescriptor::new("Review & Submit"),
];

/// An ordered, non-empty list of steps for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowDefinition {
    variant: FlowVariant,
    steps: Vec<StepDescriptor>,
}

impl FlowDefinition {
    /// The registered flow for a variant.
    pub fn for_variant(variant: FlowVariant) -> Self {
        let steps = match variant {
            FlowVariant::Client => CLIENT_STEPS.to_vec(),
            FlowVariant::Coach => COACH_STEPS.to_vec(),
        };
        Self { variant, steps }
    }

    /// A flow with an arbitrary step list.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if `steps` is empty.
    pub fn custom(
        variant: FlowVariant,
        steps: Vec<StepDescriptor>,
    ) -> Result<Self, ValidationError> {
        if steps.is_empty() {
            return Err(ValidationError::empty_field("steps"));
        }
        Ok(Self { variant, steps })
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.steps.len()
    }

    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn is_first(&self, index: usize) -> bool {
        index == 0
    }

    pub fn is_last(&self, index: usize) -> bool {
        index == self.last_index()
    }

    /// Pulls an index from an older, longer flow back into range.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.last_index())
    }

    pub fn next_index(&self, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        self.contains_index(next).then_some(next)
    }

    pub fn previous_index(&self, index: usize) -> Option<usize> {
        if self.contains_index(index) {
            index.checked_sub(1)
        } else {
            None
        }
    }

    /// The gating on a step, if any.
    pub fn gating_at(&self, index: usize) -> Option<GatingKind> {
        self.step(index).and_then(|s| s.gating)
    }

    /// Indices and gating of every gated step, in order.
    pub fn gated_steps(&self) -> impl Iterator<Item = (usize, GatingKind)> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.gating.map(|g| (i, g)))
    }
}
