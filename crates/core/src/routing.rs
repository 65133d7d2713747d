//! Routing decision — the classifier's verdict for a single query.

use crate::agent::AgentKind;
use serde::{Deserialize, Serialize};

/// The outcome of routing one query.
///
/// Produced exactly once per query and discarded after the response
/// completes; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Which agent handles this turn.
    pub agent: AgentKind,

    /// Classifier confidence in [0, 1]. Zero signals a fallback decision.
    pub confidence: f32,

    /// The raw classifier output, kept for observability.
    pub raw: String,
}

impl RoutingDecision {
    /// A fallback decision: confidence zero, raw output preserved for logs.
    pub fn fallback(agent: AgentKind, raw: impl Into<String>) -> Self {
        Self {
            agent,
            confidence: 0.0,
            raw: raw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_has_zero_confidence() {
        let d = RoutingDecision::fallback(AgentKind::TravelSupport, "unknown_label");
        assert_eq!(d.agent, AgentKind::TravelSupport);
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.raw, "unknown_label");
    }
}
