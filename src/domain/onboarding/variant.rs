//! FlowVariant - which of the two onboarding wizards is active.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The onboarding wizard a session belongs to.
///
/// Fixed for the lifetime of a session; it selects the flow definition and
/// namespaces every persisted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowVariant {
    /// Client intake wizard.
    Client,
    /// Coach application wizard (contains the payment gate).
    Coach,
}

impl FlowVariant {
    pub const ALL: [FlowVariant; 2] = [FlowVariant::Client, FlowVariant::Coach];

    /// Lowercase identifier used in storage keys and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowVariant::Client => "client",
            FlowVariant::Coach => "coach",
        }
    }
}

impl fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowVariant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(FlowVariant::Client),
            "coach" => Ok(FlowVariant::Coach),
            other => Err(ValidationError::invalid_format(
                "variant",
                format!("expected 'client' or 'coach', got '{}'", other),
            )),
        }
    }
}
