//! `waypoint route` — one-shot routing decision, for debugging the classifier.

use anyhow::Context;
use std::path::Path;

use waypoint_agents::QueryRouter;
use waypoint_config::AppConfig;
use waypoint_providers::ProviderRegistry;

pub async fn run(config_path: Option<&Path>, query: &str) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path).context("failed to load configuration")?;
    let registry = ProviderRegistry::build_from_config(&config);

    let router = QueryRouter::new(
        registry.classifier,
        config.routing.model.clone(),
        config.routing.default_agent,
        config.routing.confidence_floor,
    );

    let decision = router.route(query, &[]).await;

    println!("agent:      {}", decision.agent);
    println!("confidence: {:.2}", decision.confidence);
    println!("raw:        {}", decision.raw.trim());

    Ok(())
}
