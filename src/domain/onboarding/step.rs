//! Step descriptors and gating kinds.

use serde::Serialize;

/// Extra condition a step imposes on forward progress beyond its own validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GatingKind {
    /// Progress waits for an asynchronous signal from an embedded sub-flow.
    ///
    /// `event` names the signal the sub-flow emits; `satisfied_flag` is the
    /// data key that records satisfaction across reloads.
    #[serde(rename_all = "camelCase")]
    ExternalEvent {
        event: &'static str,
        satisfied_flag: &'static str,
    },
}

impl GatingKind {
    pub fn event(&self) -> &'static str {
        match self {
            GatingKind::ExternalEvent { event, .. } => event,
        }
    }

    pub fn satisfied_flag(&self) -> &'static str {
        match self {
            GatingKind::ExternalEvent { satisfied_flag, .. } => satisfied_flag,
        }
    }
}

/// One entry in a flow definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gating: Option<GatingKind>,
}

impl StepDescriptor {
    pub const fn new(title: &'static str) -> Self {
        Self {
            title,
            gating: None,
        }
    }

    pub const fn gated(title: &'static str, gating: GatingKind) -> Self {
        Self {
            title,
            gating: Some(gating),
        }
    }

    pub fn is_gated(&self) -> bool {
        self.gating.is_some()
    }
}
