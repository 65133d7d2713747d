//! HTTP API gateway for Waypoint.
//!
//! Exposes the chat endpoints (synchronous and SSE streaming), a health
//! check, the thin session passthrough, and the operator-triggered document
//! cache reload.
//!
//! Built on Axum. The gateway is deliberately thin: request/response framing
//! lives here, everything else is the orchestrator's job.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use waypoint_agents::{
    AgentExecutor, CancelToken, ExecutorSet, Orchestrator, QueryRouter, StreamEvent,
};
use waypoint_config::AppConfig;
use waypoint_core::agent::AgentKind;
use waypoint_core::message::{Message, Role};
use waypoint_providers::ProviderRegistry;
use waypoint_retrieval::{DocumentCache, HybridRetrieval, PureCache, PureRetrieval, VectorStore};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: Orchestrator,
    pub cache: Arc<DocumentCache>,
    pub config: AppConfig,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let parsed_origin: Result<axum::http::HeaderValue, _> =
        state.config.gateway.allowed_origin.parse();
    let cors = match parsed_origin {
        Ok(origin) => CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::exact(origin))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]),
        Err(_) => {
            warn!(
                origin = %state.config.gateway.allowed_origin,
                "Invalid CORS origin, allowing none"
            );
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/sessions/{id}", get(session_handler))
        .route("/cache/reload", post(cache_reload_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Builds every subsystem once: providers, the vector store, the document
/// cache (a blocking initialization gate — no request is served before it
/// loads), the executor table, and the orchestrator.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = ProviderRegistry::build_from_config(&config);

    // The generator-side provider also serves query embeddings.
    let store = Arc::new(VectorStore::new(
        registry.generator.clone(),
        config.retrieval.embedding_model.clone(),
    ));
    if let Some(seed) = &config.retrieval.seed_path {
        let count = store.load_seed(seed)?;
        info!(count, "Vector store seeded");
    }

    // Blocking init gate: the cache-backed strategies must never see an
    // unloaded cache once requests flow.
    let cache = Arc::new(DocumentCache::new());
    cache.load(&config.cache, config.retrieval.context_budget_chars)?;

    let budget = config.retrieval.context_budget_chars;
    let top_k = config.retrieval.top_k;
    let retrieval_timeout = std::time::Duration::from_secs(config.retrieval.timeout_secs);

    let router = QueryRouter::new(
        registry.classifier.clone(),
        config.routing.model.clone(),
        config.routing.default_agent,
        config.routing.confidence_floor,
    );

    let executors = ExecutorSet::new(
        AgentExecutor::new(
            AgentKind::TravelSupport,
            Arc::new(PureRetrieval::new(store.clone(), top_k, budget, retrieval_timeout)),
            registry.generator.clone(),
            config.generation.model.clone(),
            config.generation.max_tokens,
            config.generation.history_window,
        ),
        AgentExecutor::new(
            AgentKind::BookingPayments,
            Arc::new(HybridRetrieval::new(
                PureRetrieval::new(store.clone(), top_k, budget, retrieval_timeout),
                cache.clone(),
                budget,
            )),
            registry.generator.clone(),
            config.generation.model.clone(),
            config.generation.max_tokens,
            config.generation.history_window,
        ),
        AgentExecutor::new(
            AgentKind::Policy,
            Arc::new(PureCache::new(cache.clone())),
            registry.generator.clone(),
            config.generation.model.clone(),
            config.generation.max_tokens,
            config.generation.history_window,
        ),
    );

    let orchestrator = Orchestrator::new(router, executors);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState {
        orchestrator,
        cache,
        config,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatRequestDto {
    /// The user's message.
    pub message: String,

    /// Existing session id (omit to create a new one).
    #[serde(default)]
    pub session_id: Option<String>,

    /// Optional prior conversation history, oldest first.
    #[serde(default)]
    pub conversation_history: Option<Vec<MessageDto>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDto {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseDto {
    pub message: String,
    pub session_id: String,
    pub agent_type: AgentKind,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ChatRequestDto {
    fn into_request(self) -> waypoint_agents::ChatRequest {
        let history = self
            .conversation_history
            .unwrap_or_default()
            .into_iter()
            .filter_map(|dto| dto.into_message())
            .collect();

        waypoint_agents::ChatRequest {
            message: self.message,
            session_id: self.session_id,
            history,
        }
    }
}

impl MessageDto {
    fn into_message(self) -> Option<Message> {
        let role = match self.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            other => {
                warn!(role = %other, "Dropping history message with unknown role");
                return None;
            }
        };
        Some(match role {
            Role::User => Message::user(self.content),
            Role::Assistant => Message::assistant(self.content),
            Role::System => Message::system(self.content),
        })
    }
}

/// Map a terminal failure kind to an HTTP status.
fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "cache_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
        "retrieval_error" | "generation_error" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequestDto>,
) -> Result<Json<ChatResponseDto>, (StatusCode, Json<ErrorResponse>)> {
    info!("POST /chat");

    match state.orchestrator.chat(payload.into_request()).await {
        Ok(outcome) => Ok(Json(ChatResponseDto {
            message: outcome.message,
            session_id: outcome.session_id.to_string(),
            agent_type: outcome.agent,
        })),
        Err(failure) => Err((
            status_for_kind(&failure.kind),
            Json(ErrorResponse {
                error: failure.kind,
                message: failure.message,
            }),
        )),
    }
}

async fn chat_stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequestDto>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    info!("POST /chat/stream");

    // Client disconnect drops this stream; the pipeline observes the closed
    // channel on its next send and stops consuming the generator.
    let (_, rx) = state
        .orchestrator
        .chat_stream(payload.into_request(), CancelToken::never())
        .await;

    let stream = ReceiverStream::new(rx).map(|event: StreamEvent| {
        let event_type = event.event_type();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Sse::new(stream)
}

/// Thin session passthrough. Durable session content lives with an external
/// collaborator; the core only echoes identifiers.
async fn session_handler(Path(id): Path<String>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "session_id": id }))
}

async fn cache_reload_handler(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    info!("POST /cache/reload");

    state
        .cache
        .reload(
            &state.config.cache,
            state.config.retrieval.context_budget_chars,
        )
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.kind().to_string(),
                    message: "Cache reload failed.".into(),
                }),
            )
        })?;

    let documents = state.cache.document_count().unwrap_or(0);
    Ok(Json(
        serde_json::json!({ "status": "reloaded", "documents": documents }),
    ))
}
