//! Waypoint CLI — the main entry point.
//!
//! Commands:
//! - `serve`  — Start the HTTP gateway
//! - `route`  — Show the routing decision for a single query
//! - `doctor` — Diagnose configuration problems

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "waypoint",
    about = "Waypoint — agent-routed customer service AI",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Route a query and print the decision without generating a response
    Route {
        /// The query to classify
        query: String,
    },

    /// Diagnose configuration problems
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(cli.config.as_deref(), port).await?,
        Commands::Route { query } => commands::route::run(cli.config.as_deref(), &query).await?,
        Commands::Doctor => commands::doctor::run(cli.config.as_deref())?,
    }

    Ok(())
}
