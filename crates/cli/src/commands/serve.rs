//! `waypoint serve` — load config and start the gateway.

use anyhow::Context;
use std::path::Path;
use waypoint_config::AppConfig;

pub async fn run(config_path: Option<&Path>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::load(config_path).context("failed to load configuration")?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    waypoint_gateway::start(config)
        .await
        .map_err(|e| anyhow::anyhow!("gateway failed: {e}"))
}
