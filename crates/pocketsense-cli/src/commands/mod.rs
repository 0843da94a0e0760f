//! CLI command implementations
//!
//! - `serve` - REST API server
//! - `categorize` - one-off transaction categorization
//! - `insights` - insight generation from a snapshot file
//! - `health` - backend liveness probe
//! - `config` - effective configuration and prompt listing

pub mod categorize;
pub mod config;
pub mod health;
pub mod insights;
pub mod serve;

pub use categorize::*;
pub use config::*;
pub use health::*;
pub use insights::*;
pub use serve::*;

use std::path::Path;

use anyhow::{Context, Result};
use pocketsense_core::{InferenceConfig, InsightPipeline};

/// Load the layered inference config
pub fn load_config(config_path: Option<&Path>) -> Result<InferenceConfig> {
    InferenceConfig::load(config_path).context("Failed to load inference configuration")
}

/// Load config and build the inference pipeline
pub fn open_pipeline(config_path: Option<&Path>) -> Result<InsightPipeline> {
    let config = load_config(config_path)?;
    InsightPipeline::from_config(config).context("Failed to initialize inference pipeline")
}
