//! Configuration loading, validation, and management for Waypoint.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! for provider API keys. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use waypoint_core::AgentKind;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Provider-specific configurations, keyed by provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Query routing (classifier) configuration.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Response generation configuration.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Dynamic retrieval configuration.
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Static document cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP gateway configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Per-provider settings. The API key may come from the environment instead.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// Classifier/router settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Which provider entry serves the classifier role.
    #[serde(default = "default_classifier_provider")]
    pub provider: String,

    /// Classifier model — cheap and low-latency by design.
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Where queries land when classification fails or is unrecognized.
    #[serde(default = "default_agent")]
    pub default_agent: AgentKind,

    /// Decisions below this confidence fall back to the default agent.
    /// Zero means the classifier's label is always trusted.
    #[serde(default)]
    pub confidence_floor: f32,

    /// Per-call timeout for the classifier.
    #[serde(default = "default_routing_timeout")]
    pub timeout_secs: u64,
}

fn default_classifier_provider() -> String {
    "anthropic".into()
}
fn default_classifier_model() -> String {
    "claude-haiku-4-5".into()
}
fn default_agent() -> AgentKind {
    AgentKind::TravelSupport
}
fn default_routing_timeout() -> u64 {
    15
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: default_classifier_provider(),
            model: default_classifier_model(),
            default_agent: default_agent(),
            confidence_floor: 0.0,
            timeout_secs: default_routing_timeout(),
        }
    }
}

/// Generator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Which provider entry serves the generator role.
    #[serde(default = "default_generator_provider")]
    pub provider: String,

    /// Generation model — quality-oriented and streaming-capable.
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Maximum tokens per generated response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-call timeout for generation.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// How many trailing history messages the executors render into the
    /// prompt. Explicit configuration — there is no hidden truncation.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_generator_provider() -> String {
    "openai".into()
}
fn default_generator_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_generation_timeout() -> u64 {
    120
}
fn default_history_window() -> usize {
    4
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generator_provider(),
            model: default_generator_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            history_window: default_history_window(),
        }
    }
}

/// Dynamic retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks per similarity search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Character budget for one assembled context.
    #[serde(default = "default_context_budget")]
    pub context_budget_chars: usize,

    /// Embedding model name, passed through to the store's embedder.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Optional path to a pre-embedded chunk seed file (JSON array).
    /// Population of the store otherwise belongs to the ingestion pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,

    /// Per-call timeout for store operations.
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

fn default_top_k() -> usize {
    5
}
fn default_context_budget() -> usize {
    6000
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_retrieval_timeout() -> u64 {
    10
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            context_budget_chars: default_context_budget(),
            embedding_model: default_embedding_model(),
            seed_path: None,
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

/// Static document cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory of policy reference documents (.txt files).
    #[serde(default = "default_policy_dir")]
    pub policy_dir: PathBuf,
}

fn default_policy_dir() -> PathBuf {
    PathBuf::from("./data/policy")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy_dir: default_policy_dir(),
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed by the CORS layer.
    #[serde(default = "default_origin")]
    pub allowed_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}
fn default_origin() -> String {
    "http://localhost:3000".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_origin(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("providers", &self.providers)
            .field("routing", &self.routing)
            .field("generation", &self.generation)
            .field("retrieval", &self.retrieval)
            .field("cache", &self.cache)
            .field("gateway", &self.gateway)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist, then apply environment overrides and
    /// validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p).map_err(|e| ConfigError::Io {
                    path: p.to_path_buf(),
                    source: e,
                })?;
                Self::from_toml_str(&raw)?
            }
            Some(p) => {
                warn!(path = %p.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no env overrides, no validation).
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Pull API keys from well-known environment variables when the config
    /// file omits them.
    pub fn apply_env_overrides(&mut self) {
        for (name, var) in [("anthropic", "ANTHROPIC_API_KEY"), ("openai", "OPENAI_API_KEY")] {
            if let Ok(key) = std::env::var(var) {
                let entry = self.providers.entry(name.to_string()).or_default();
                if entry.api_key.is_none() {
                    entry.api_key = Some(key);
                }
            }
        }
    }

    /// Validate the configuration. Called at startup, before anything is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.routing.confidence_floor) {
            return Err(ConfigError::Invalid(format!(
                "routing.confidence_floor must be in [0, 1], got {}",
                self.routing.confidence_floor
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        if self.retrieval.context_budget_chars == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.context_budget_chars must be > 0".into(),
            ));
        }
        if self.generation.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_tokens must be > 0".into(),
            ));
        }
        if self.gateway.port == 0 {
            return Err(ConfigError::Invalid("gateway.port must be non-zero".into()));
        }
        Ok(())
    }

    /// Resolve the API key for a named provider entry, if configured.
    pub fn api_key_for(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.as_deref())
    }

    /// Resolve the base URL override for a named provider entry.
    pub fn api_url_for(&self, provider: &str) -> Option<&str> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_url.as_deref())
    }
}
