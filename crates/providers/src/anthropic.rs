//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly (not an OpenAI-compatible proxy).
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Streaming via SSE with `content_block_delta` events
//!
//! This is the default backend for the classifier role: single-shot, cheap,
//! low-latency calls with a small max_tokens cap.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use waypoint_core::error::ProviderError;
use waypoint_core::message::{Message, Role};
use waypoint_core::provider::*;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Extract system messages from the message list.
    /// Anthropic puts the system prompt as a top-level field, not in messages.
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut non_system: Vec<&Message> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(&msg.content),
                _ => non_system.push(msg),
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, non_system)
    }

    fn to_api_messages(messages: &[&Message]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                };
                serde_json::json!({ "role": role, "content": msg.content })
            })
            .collect()
    }

    fn build_body(request: &CompletionRequest, streaming: bool) -> serde_json::Value {
        let (system, messages) = Self::extract_system(&request.messages);
        let max_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&messages),
            "max_tokens": max_tokens,
            "temperature": request.temperature,
        });

        if streaming {
            body["stream"] = serde_json::json!(true);
        }
        if let Some(ref sys) = system {
            body["system"] = serde_json::json!(sys);
        }

        body
    }

    /// Map a non-200 status to the provider error it represents.
    fn status_error(status: u16, error_body: String) -> ProviderError {
        match status {
            429 => ProviderError::RateLimited {
                retry_after_secs: 5,
            },
            401 | 403 => {
                ProviderError::AuthenticationFailed("Invalid Anthropic API key".into())
            }
            _ => {
                warn!(status, body = %error_body, "Anthropic API error");
                ProviderError::ApiError {
                    status_code: status,
                    message: error_body,
                }
            }
        }
    }
}

#[async_trait]
impl waypoint_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request, false);

        debug!(provider = "anthropic", model = %request.model, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, error_body));
        }

        let api_resp: AnthropicResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Anthropic response: {e}"),
            })?;

        let content = api_resp
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            message: Message::assistant(content),
            model: api_resp.model,
        })
    }

    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<TokenChunk, ProviderError>>,
        ProviderError,
    > {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request, true);

        debug!(provider = "anthropic", model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, error_body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    if let Some(event_type) = line.strip_prefix("event: ") {
                        if event_type.trim() == "message_stop" {
                            let _ = tx
                                .send(Ok(TokenChunk {
                                    content: None,
                                    done: true,
                                }))
                                .await;
                            return;
                        }
                        continue;
                    }

                    if let Some(data) = line.strip_prefix("data: ") {
                        let data = data.trim();
                        if data.is_empty() {
                            continue;
                        }

                        let event: serde_json::Value = match serde_json::from_str(data) {
                            Ok(v) => v,
                            Err(e) => {
                                trace!(error = %e, data = %data, "Ignoring unparseable Anthropic SSE");
                                continue;
                            }
                        };

                        if event["type"].as_str() == Some("content_block_delta") {
                            if let Some(text) = event["delta"]["text"].as_str() {
                                if tx
                                    .send(Ok(TokenChunk {
                                        content: Some(text.to_string()),
                                        done: false,
                                    }))
                                    .await
                                    .is_err()
                                {
                                    // Receiver dropped — stop consuming.
                                    return;
                                }
                            }
                        }
                    }
                }
            }

            // Stream ended without message_stop.
            let _ = tx
                .send(Err(ProviderError::StreamInterrupted(
                    "stream ended before message_stop".into(),
                )))
                .await;
        });

        Ok(rx)
    }
}

// ── API wire types ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    model: String,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: Option<String>,
}
