//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PocketSense - LLM-assisted transaction categorization and budget insights
#[derive(Parser)]
#[command(name = "pocketsense")]
#[command(about = "Categorize transactions and generate budget insights with a local LLM", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Inference config file (defaults to the user data directory when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Categorize a single transaction description
    Categorize {
        /// Transaction description, e.g. "Uber ride to work"
        description: String,
    },

    /// Generate insights from a JSON snapshot of transactions and budgets
    ///
    /// The file holds `{"transactions": [...], "budgets": [...]}`, the same
    /// body `POST /generate_insights` accepts.
    Insights {
        /// Snapshot JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check whether the inference backend is reachable
    Health,

    /// Show the effective configuration and prompt overrides
    Config,
}
