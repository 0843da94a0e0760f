//! Categorize command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_pipeline;

pub async fn cmd_categorize(config_path: Option<&Path>, description: &str) -> Result<()> {
    let pipeline = open_pipeline(config_path)?;
    let category = pipeline
        .categorize(description)
        .await
        .context("Categorization failed")?;

    println!("{}", category);
    Ok(())
}
