//! Error types for the Waypoint domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each stage of request
//! handling has its own error variant, and `Error::kind()` gives the stable
//! snake_case string used in wire error frames.

use thiserror::Error;

/// The top-level error type for all Waypoint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The classifier call failed or returned unparseable output.
    ///
    /// Non-fatal: the router recovers locally by falling back to the
    /// configured default agent. This variant only escapes the router in
    /// logs, never to a caller.
    #[error("Classification error: {0}")]
    Classification(#[from] ClassificationError),

    /// The context store was unreachable or embedding failed. Fatal.
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The static document cache is not in a servable state. Fatal, and
    /// should not occur after startup.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// The generation provider failed. Fatal.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    /// The caller disconnected; terminates without surfacing to anyone.
    #[error("Request cancelled by caller")]
    Cancelled,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable kind string carried in error frames.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Classification(_) => "classification_error",
            Error::Retrieval(_) => "retrieval_error",
            Error::Cache(_) => "cache_unavailable",
            Error::Generation(_) => "generation_error",
            Error::Cancelled => "cancelled",
            Error::Config { .. } => "config_error",
            Error::Serialization(_) => "serialization_error",
        }
    }
}

// --- Stage errors ---

#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    #[error("classifier call failed: {0}")]
    CallFailed(String),

    #[error("classifier output unparseable: {0}")]
    Unparseable(String),
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("context store unreachable: {0}")]
    StoreUnavailable(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("static document cache not loaded")]
    NotLoaded,

    #[error("no cached documents for scope '{scope}'")]
    ScopeMissing { scope: String },
}

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("generation timed out after {0}s")]
    Timeout(u64),

    #[error("provider returned an empty response")]
    Empty,
}

/// Errors from a single LLM provider call.
///
/// Both provider roles (classifier and generator) share this type; callers
/// map it into `ClassificationError` or `GenerationError` depending on which
/// stage made the call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
