//! PocketSense CLI
//!
//! Usage:
//!   pocketsense serve --port 8000            Start the REST API
//!   pocketsense categorize "Uber to work"    Categorize one transaction
//!   pocketsense insights --file snap.json    Generate budget insights
//!   pocketsense health                       Probe the inference backend
//!   pocketsense config                       Show effective configuration

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(config, &host, port).await,
        Commands::Categorize { description } => {
            commands::cmd_categorize(config, &description).await
        }
        Commands::Insights { file } => commands::cmd_insights(config, &file).await,
        Commands::Health => commands::cmd_health(config).await,
        Commands::Config => commands::cmd_config(config),
    }
}
