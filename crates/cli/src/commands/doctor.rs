//! `waypoint doctor` — diagnose configuration problems before serving.

use anyhow::Context;
use std::path::Path;
use waypoint_config::AppConfig;

pub fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("Waypoint doctor\n");

    let config = AppConfig::load(config_path).context("failed to load configuration")?;
    println!("✓ configuration loads and validates");

    check_api_key(&config, &config.routing.provider, "classifier");
    check_api_key(&config, &config.generation.provider, "generator");

    if config.cache.policy_dir.is_dir() {
        let docs = std::fs::read_dir(&config.cache.policy_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
                    .count()
            })
            .unwrap_or(0);
        if docs > 0 {
            println!(
                "✓ policy cache directory {} ({docs} documents)",
                config.cache.policy_dir.display()
            );
        } else {
            println!(
                "✗ policy cache directory {} contains no .txt documents",
                config.cache.policy_dir.display()
            );
        }
    } else {
        println!(
            "✗ policy cache directory {} does not exist — the policy agent will serve an empty context",
            config.cache.policy_dir.display()
        );
    }

    match &config.retrieval.seed_path {
        Some(path) if path.is_file() => println!("✓ vector store seed {}", path.display()),
        Some(path) => println!("✗ vector store seed {} not found", path.display()),
        None => println!(
            "- no vector store seed configured; retrieval serves an empty store until ingestion runs"
        ),
    }

    println!(
        "\nrouting:    {} via {}",
        config.routing.model, config.routing.provider
    );
    println!(
        "generation: {} via {}",
        config.generation.model, config.generation.provider
    );
    println!(
        "gateway:    {}:{}",
        config.gateway.host, config.gateway.port
    );

    Ok(())
}

fn check_api_key(config: &AppConfig, provider: &str, role: &str) {
    if config.api_key_for(provider).is_some_and(|k| !k.is_empty()) {
        println!("✓ {role} provider '{provider}' has an API key");
    } else {
        println!("✗ {role} provider '{provider}' has no API key configured");
    }
}
