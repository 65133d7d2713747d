//! Query router — assigns each incoming query to an agent kind.
//!
//! A cost-efficient classifier model is asked to emit one JSON object naming
//! the agent. The router is deliberately forgiving about the reply: it
//! extracts the outermost JSON braces, tolerates label noise, clamps the
//! confidence, and treats every failure — provider error, unparseable
//! output, unknown label — as a local fallback to the configured default
//! agent with confidence zero. A routing call never errors to the caller;
//! anomalies go to the log.
//!
//! No retrieval, no side effects beyond the model call, no shared mutable
//! state: safe to call concurrently for independent queries.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use waypoint_core::agent::AgentKind;
use waypoint_core::message::Message;
use waypoint_core::provider::CompletionRequest;
use waypoint_core::routing::RoutingDecision;
use waypoint_core::Provider;

const CLASSIFIER_TEMPERATURE: f32 = 0.3;
const CLASSIFIER_MAX_TOKENS: u32 = 200;

const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are a routing agent for a travel agency customer service system.
Your job is to analyze customer queries and route them to the most appropriate specialized agent.

Available agents:
1. travel_support - Handles questions about destinations, travel tips, itineraries, general travel advice
2. booking_payments - Handles questions about pricing, packages, payments, invoices, booking costs
3. policy - Handles questions about cancellation policies, refunds, terms of service, travel insurance, baggage policies

Analyze the query and respond with ONLY a JSON object in this exact format:
{\"agent\": \"travel_support\" | \"booking_payments\" | \"policy\", \"confidence\": 0.0-1.0}

Be precise and choose the most appropriate agent based on the query's primary concern.";

/// Routes queries to agent kinds via the classifier provider.
pub struct QueryRouter {
    classifier: Arc<dyn Provider>,
    model: String,
    default_agent: AgentKind,
    confidence_floor: f32,
}

#[derive(Deserialize)]
struct ClassifierReply {
    agent: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl QueryRouter {
    pub fn new(
        classifier: Arc<dyn Provider>,
        model: impl Into<String>,
        default_agent: AgentKind,
        confidence_floor: f32,
    ) -> Self {
        Self {
            classifier,
            model: model.into(),
            default_agent,
            confidence_floor,
        }
    }

    /// Produce exactly one routing decision for a query.
    pub async fn route(&self, query: &str, history: &[Message]) -> RoutingDecision {
        let mut messages = vec![Message::system(CLASSIFIER_SYSTEM_PROMPT)];
        // Recent history can disambiguate follow-ups ("and how do I cancel it?").
        for msg in history.iter().rev().take(2).rev() {
            messages.push(msg.clone());
        }
        messages.push(Message::user(format!("Route this query: {query}")));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: CLASSIFIER_TEMPERATURE,
            max_tokens: Some(CLASSIFIER_MAX_TOKENS),
            stream: false,
        };

        let raw = match self.classifier.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                warn!(error = %e, "Classifier call failed, routing to default agent");
                return RoutingDecision::fallback(self.default_agent, format!("<error: {e}>"));
            }
        };

        let decision = self.parse_decision(&raw);
        info!(
            agent = %decision.agent,
            confidence = decision.confidence,
            "Query routed"
        );
        decision
    }

    /// Parse the classifier's reply into a decision, falling back to the
    /// default agent when the reply is unusable.
    fn parse_decision(&self, raw: &str) -> RoutingDecision {
        let Some(reply) = extract_json::<ClassifierReply>(raw) else {
            warn!(raw = %raw, "Classifier output unparseable, routing to default agent");
            return RoutingDecision::fallback(self.default_agent, raw);
        };

        let Some(agent) = AgentKind::parse_label(&reply.agent) else {
            warn!(label = %reply.agent, "Classifier emitted unrecognized label, routing to default agent");
            return RoutingDecision::fallback(self.default_agent, raw);
        };

        let confidence = reply.confidence.unwrap_or(0.7).clamp(0.0, 1.0);

        if confidence < self.confidence_floor {
            warn!(
                agent = %agent,
                confidence,
                floor = self.confidence_floor,
                "Routing confidence below floor, using default agent"
            );
            return RoutingDecision {
                agent: self.default_agent,
                confidence,
                raw: raw.to_string(),
            };
        }

        RoutingDecision {
            agent,
            confidence,
            raw: raw.to_string(),
        }
    }
}

/// Extract and parse the outermost JSON object in a reply that may carry
/// surrounding prose.
fn extract_json<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedProvider;

    fn router_with(reply: &str) -> QueryRouter {
        QueryRouter::new(
            Arc::new(ScriptedProvider::single_text(reply)),
            "classifier-model",
            AgentKind::TravelSupport,
            0.0,
        )
    }

    #[tokio::test]
    async fn routes_on_well_formed_reply() {
        let router = router_with(r#"{"agent": "policy", "confidence": 0.93}"#);
        let decision = router.route("What is your cancellation policy?", &[]).await;
        assert_eq!(decision.agent, AgentKind::Policy);
        assert!((decision.confidence - 0.93).abs() < 1e-6);
    }

    #[tokio::test]
    async fn extracts_json_from_surrounding_prose() {
        let router = router_with(
            "Sure! Here's my routing decision:\n{\"agent\": \"booking_payments\", \"confidence\": 0.8}\nHope that helps.",
        );
        let decision = router.route("How much is a flight?", &[]).await;
        assert_eq!(decision.agent, AgentKind::BookingPayments);
    }

    #[tokio::test]
    async fn unrecognized_label_falls_back_with_zero_confidence() {
        let router = router_with(r#"{"agent": "unknown_label", "confidence": 0.9}"#);
        let decision = router.route("hello", &[]).await;
        assert_eq!(decision.agent, AgentKind::TravelSupport);
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.raw.contains("unknown_label"));
    }

    #[tokio::test]
    async fn unparseable_output_falls_back() {
        let router = router_with("I think this is about travel maybe?");
        let decision = router.route("hello", &[]).await;
        assert_eq!(decision.agent, AgentKind::TravelSupport);
        assert_eq!(decision.confidence, 0.0);
    }

    #[tokio::test]
    async fn provider_failure_falls_back_not_errors() {
        let router = QueryRouter::new(
            Arc::new(ScriptedProvider::always_failing()),
            "classifier-model",
            AgentKind::Policy,
            0.0,
        );
        let decision = router.route("hello", &[]).await;
        assert_eq!(decision.agent, AgentKind::Policy);
        assert_eq!(decision.confidence, 0.0);
    }

    #[tokio::test]
    async fn confidence_clamped_to_unit_interval() {
        let router = router_with(r#"{"agent": "policy", "confidence": 7.5}"#);
        let decision = router.route("terms?", &[]).await;
        assert_eq!(decision.confidence, 1.0);
    }

    #[tokio::test]
    async fn below_floor_confidence_uses_default_agent() {
        let router = QueryRouter::new(
            Arc::new(ScriptedProvider::single_text(
                r#"{"agent": "policy", "confidence": 0.2}"#,
            )),
            "classifier-model",
            AgentKind::TravelSupport,
            0.5,
        );
        let decision = router.route("hmm", &[]).await;
        assert_eq!(decision.agent, AgentKind::TravelSupport);
        // The reported confidence is the classifier's, not zero.
        assert!((decision.confidence - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn missing_confidence_defaults() {
        let router = router_with(r#"{"agent": "travel_support"}"#);
        let decision = router.route("tips?", &[]).await;
        assert_eq!(decision.agent, AgentKind::TravelSupport);
        assert!((decision.confidence - 0.7).abs() < 1e-6);
    }
}
