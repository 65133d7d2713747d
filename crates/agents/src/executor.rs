//! Agent executors — one fixed pairing per agent kind.
//!
//! Each executor binds {retrieval strategy, prompt template, generation
//! provider} at construction time. The set of executors is a closed static
//! table keyed by `AgentKind`; nothing is dispatched over open-ended types.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::prompts;
use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::error::{Error, GenerationError, ProviderError};
use waypoint_core::message::Message;
use waypoint_core::provider::{CompletionRequest, TokenChunk};
use waypoint_core::store::RetrievalStrategy;
use waypoint_core::Provider;

/// Generation temperature per agent kind. Part of each agent's identity:
/// conversational for travel advice, precise for policy wording.
fn temperature_for(kind: AgentKind) -> f32 {
    match kind {
        AgentKind::TravelSupport => 0.7,
        AgentKind::BookingPayments => 0.5,
        AgentKind::Policy => 0.3,
    }
}

/// One agent executor: a fixed (strategy, template, provider) triple.
pub struct AgentExecutor {
    kind: AgentKind,
    strategy: Arc<dyn RetrievalStrategy>,
    generator: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    history_window: usize,
}

impl AgentExecutor {
    pub fn new(
        kind: AgentKind,
        strategy: Arc<dyn RetrievalStrategy>,
        generator: Arc<dyn Provider>,
        model: impl Into<String>,
        max_tokens: u32,
        history_window: usize,
    ) -> Self {
        Self {
            kind,
            strategy,
            generator,
            model: model.into(),
            temperature: temperature_for(kind),
            max_tokens,
            history_window,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Name of the retrieval strategy this executor is bound to.
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Build this agent's context via its bound strategy.
    pub async fn fetch_context(
        &self,
        query: &str,
        history: &[Message],
    ) -> Result<AssembledContext, Error> {
        self.strategy.fetch_context(query, history, self.kind).await
    }

    /// Invoke the generator in streaming mode over the rendered prompt.
    ///
    /// On a provider error mid-generation the stream carries the error; any
    /// retry happened inside the provider wrapper, strictly before the first
    /// token reached us.
    pub async fn respond(
        &self,
        query: &str,
        history: &[Message],
        context: &AssembledContext,
    ) -> Result<mpsc::Receiver<Result<TokenChunk, ProviderError>>, Error> {
        let messages =
            prompts::build_messages(self.kind, context, history, query, self.history_window);

        debug!(
            agent = %self.kind,
            strategy = self.strategy.name(),
            context_chars = context.text.len(),
            history = history.len().min(self.history_window),
            "Starting generation"
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            stream: true,
        };

        self.generator
            .stream(request)
            .await
            .map_err(|e| Error::Generation(GenerationError::from(e)))
    }
}

/// The closed executor table — one entry per agent kind.
pub struct ExecutorSet {
    travel_support: AgentExecutor,
    booking_payments: AgentExecutor,
    policy: AgentExecutor,
}

impl ExecutorSet {
    /// Assemble the table. Each executor must carry the kind of its slot.
    pub fn new(
        travel_support: AgentExecutor,
        booking_payments: AgentExecutor,
        policy: AgentExecutor,
    ) -> Self {
        debug_assert_eq!(travel_support.kind(), AgentKind::TravelSupport);
        debug_assert_eq!(booking_payments.kind(), AgentKind::BookingPayments);
        debug_assert_eq!(policy.kind(), AgentKind::Policy);
        Self {
            travel_support,
            booking_payments,
            policy,
        }
    }

    /// Static table lookup.
    pub fn executor(&self, kind: AgentKind) -> &AgentExecutor {
        match kind {
            AgentKind::TravelSupport => &self.travel_support,
            AgentKind::BookingPayments => &self.booking_payments,
            AgentKind::Policy => &self.policy,
        }
    }
}
