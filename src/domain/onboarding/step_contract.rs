//! StepContract - what every step UI implements, and the narrow handle it
//! gets back into the engine.

use super::data::OnboardingData;

/// The only way a step can influence the engine.
pub trait StepSink {
    /// Reports the step's current validity. Called on every recomputation.
    fn set_step_valid(&self, valid: bool);

    /// Writes field-level updates into session data.
    fn update_data(&self, partial: OnboardingData);
}

/// A single wizard step.
///
/// `on_change` runs when the step becomes active and after every data
/// change. It must report validity through `sink` each time.
pub trait StepContract {
    fn on_change(&mut self, data: &OnboardingData, sink: &dyn StepSink);
}

/// Step that is valid once every listed key holds a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    keys: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_satisfied_by(&self, data: &OnboardingData) -> bool {
        self.keys.iter().all(|k| data.has_value(k))
    }

    /// Keys still missing a value, in declaration order.
    pub fn missing<'a>(&'a self, data: &OnboardingData) -> Vec<&'a str> {
        self.keys
            .iter()
            .filter(|k| !data.has_value(k))
            .map(String::as_str)
            .collect()
    }
}

impl StepContract for RequiredFields {
    fn on_change(&mut self, data: &OnboardingData, sink: &dyn StepSink) {
        sink.set_step_valid(self.is_satisfied_by(data));
    }
}
