//! Provider registry — builds the classifier and generator roles from config.
//!
//! Both roles share the `Provider` contract, so either can be served by any
//! backend; the registry only decides which wire implementation a provider
//! name maps to and wraps each role in its timeout/retry policy.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::anthropic::AnthropicProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::RetryProvider;
use waypoint_config::AppConfig;
use waypoint_core::Provider;

/// The two provider roles Waypoint consumes.
pub struct ProviderRegistry {
    /// Cheap, low-latency, single-shot — routes queries.
    pub classifier: Arc<dyn Provider>,

    /// Quality-oriented, streaming-capable — generates answers.
    pub generator: Arc<dyn Provider>,
}

impl ProviderRegistry {
    /// Build both roles from configuration.
    pub fn build_from_config(config: &AppConfig) -> Self {
        let classifier = build_provider(config, &config.routing.provider);
        let generator = build_provider(config, &config.generation.provider);

        info!(
            classifier = %config.routing.provider,
            generator = %config.generation.provider,
            "Providers configured"
        );

        Self {
            classifier: Arc::new(RetryProvider::new(
                classifier,
                Duration::from_secs(config.routing.timeout_secs),
            )),
            generator: Arc::new(RetryProvider::new(
                generator,
                Duration::from_secs(config.generation.timeout_secs),
            )),
        }
    }
}

/// Construct the wire implementation for a named provider entry.
fn build_provider(config: &AppConfig, name: &str) -> Arc<dyn Provider> {
    let api_key = config.api_key_for(name).unwrap_or_default().to_string();

    if name == "anthropic" {
        let mut p = AnthropicProvider::new(api_key);
        if let Some(url) = config.api_url_for(name) {
            p = p.with_base_url(url);
        }
        Arc::new(p)
    } else {
        let base_url = config
            .api_url_for(name)
            .map(String::from)
            .unwrap_or_else(|| default_base_url(name));
        Arc::new(OpenAiCompatProvider::new(name, base_url, api_key))
    }
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_both_roles_from_defaults() {
        let config = AppConfig::default();
        let registry = ProviderRegistry::build_from_config(&config);
        assert_eq!(registry.classifier.name(), "anthropic");
        assert_eq!(registry.generator.name(), "openai");
    }

    #[test]
    fn known_base_urls() {
        assert_eq!(default_base_url("openai"), "https://api.openai.com/v1");
        assert_eq!(default_base_url("ollama"), "http://localhost:11434/v1");
    }

    #[test]
    fn custom_generator_provider() {
        let mut config = AppConfig::default();
        config.generation.provider = "groq".into();
        let registry = ProviderRegistry::build_from_config(&config);
        assert_eq!(registry.generator.name(), "groq");
    }
}
