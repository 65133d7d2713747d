//! Shared test doubles for the agent layer.
//!
//! Deterministic, script-driven stand-ins for the provider and strategy
//! traits so routing, execution, and streaming can be tested without any
//! network dependency.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use waypoint_core::agent::AgentKind;
use waypoint_core::context::AssembledContext;
use waypoint_core::error::{Error, ProviderError, RetrievalError};
use waypoint_core::message::Message;
use waypoint_core::provider::{CompletionRequest, CompletionResponse, TokenChunk};
use waypoint_core::store::RetrievalStrategy;
use waypoint_core::Provider;

/// A provider that replays a scripted reply, or always fails.
pub struct ScriptedProvider {
    reply: Option<String>,
}

impl ScriptedProvider {
    /// Always replies with the given text. Streaming splits it into
    /// word-sized chunks so multi-chunk behavior gets exercised.
    pub fn single_text(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
        }
    }

    /// Every call fails with a network error.
    pub fn always_failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        match &self.reply {
            Some(text) => Ok(CompletionResponse {
                message: Message::assistant(text.clone()),
                model: request.model,
            }),
            None => Err(ProviderError::Network("scripted failure".into())),
        }
    }

    async fn stream(
        &self,
        _request: CompletionRequest,
    ) -> Result<mpsc::Receiver<Result<TokenChunk, ProviderError>>, ProviderError> {
        let Some(text) = self.reply.clone() else {
            return Err(ProviderError::Network("scripted failure".into()));
        };

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            for piece in text.split_inclusive(' ') {
                if tx
                    .send(Ok(TokenChunk {
                        content: Some(piece.to_string()),
                        done: false,
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = tx
                .send(Ok(TokenChunk {
                    content: None,
                    done: true,
                }))
                .await;
        });
        Ok(rx)
    }
}

/// A strategy returning a fixed context, or failing like an unreachable store.
pub struct FixedStrategy {
    context: Option<String>,
}

impl FixedStrategy {
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            context: Some(text.into()),
        }
    }

    pub fn store_unavailable() -> Self {
        Self { context: None }
    }
}

#[async_trait]
impl RetrievalStrategy for FixedStrategy {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch_context(
        &self,
        _query: &str,
        _history: &[Message],
        _scope: AgentKind,
    ) -> Result<AssembledContext, Error> {
        match &self.context {
            Some(text) => Ok(AssembledContext {
                text: text.clone(),
                chunks_included: 1,
                truncated: false,
            }),
            None => Err(RetrievalError::StoreUnavailable("scripted outage".into()).into()),
        }
    }
}

/// Build an executor set where every agent shares one generator and each
/// kind has the given strategy.
pub fn executor_set_with(
    generator: Arc<dyn Provider>,
    travel: Arc<dyn RetrievalStrategy>,
    booking: Arc<dyn RetrievalStrategy>,
    policy: Arc<dyn RetrievalStrategy>,
) -> crate::executor::ExecutorSet {
    use crate::executor::AgentExecutor;
    crate::executor::ExecutorSet::new(
        AgentExecutor::new(
            AgentKind::TravelSupport,
            travel,
            generator.clone(),
            "gen-model",
            512,
            4,
        ),
        AgentExecutor::new(
            AgentKind::BookingPayments,
            booking,
            generator.clone(),
            "gen-model",
            512,
            4,
        ),
        AgentExecutor::new(AgentKind::Policy, policy, generator, "gen-model", 512, 4),
    )
}
