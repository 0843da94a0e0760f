//! Insights command implementation

use std::path::Path;

use anyhow::{Context, Result};
use pocketsense_core::FinancialSnapshot;
use tracing::info;

use super::open_pipeline;

/// Read a snapshot JSON file
pub fn read_snapshot(path: &Path) -> Result<FinancialSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid snapshot JSON in {}", path.display()))
}

/// Generate insights and print them as pretty JSON on stdout
pub async fn cmd_insights(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let snapshot = read_snapshot(file)?;
    let pipeline = open_pipeline(config_path)?;

    let run = pipeline
        .generate_insights_detailed(&snapshot)
        .await
        .context("Insight generation failed")?;

    info!(
        count = run.insights.len(),
        attempts = run.attempts,
        retries = run.retries,
        "Insight generation finished"
    );

    println!("{}", serde_json::to_string_pretty(&run.insights)?);
    Ok(())
}
