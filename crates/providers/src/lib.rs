//! LLM Provider implementations for Waypoint.
//!
//! All providers implement the `waypoint_core::Provider` trait. The registry
//! builds the classifier and generator roles from configuration.

pub mod anthropic;
pub mod openai_compat;
pub mod registry;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::ProviderRegistry;
pub use retry::RetryProvider;
