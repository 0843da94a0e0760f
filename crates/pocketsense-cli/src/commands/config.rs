//! Config command implementation

use std::path::Path;

use anyhow::{Context, Result};
use pocketsense_core::config::default_config_path;
use pocketsense_core::PromptLibrary;

use super::load_config;

/// Print the effective configuration after all layers are applied
pub fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let prompts = PromptLibrary::load(config.effective_prompts_dir().as_deref())
        .context("Failed to load prompt library")?;

    println!("Inference Configuration:\n");
    match &config.source {
        Some(path) => println!("  Source:          {}", path.display()),
        None => println!("  Source:          embedded defaults"),
    }
    if let Some(path) = default_config_path() {
        println!("  Default file:    {}", path.display());
    }
    println!();

    println!("[backend]");
    println!("  kind:            {}", config.backend);
    println!("  host:            {}", config.host);
    println!("  model:           {}", config.model);
    println!("  health timeout:  {:?}", config.health_timeout);
    println!();

    let categorize = &config.categorize;
    println!("[categorize]");
    println!("  timeout:         {:?}", categorize.timeout);
    println!("  temperature:     {}", categorize.temperature);
    println!("  cache capacity:  {}", categorize.cache_capacity);
    println!();

    let insights = &config.insights;
    println!("[insights]");
    println!("  timeout:         {:?}", insights.timeout);
    println!("  max attempts:    {}", insights.max_attempts);
    println!("  retry delay:     {:?}", insights.retry_delay);
    println!("  temperature:     {}", insights.temperature);
    println!("  top_p:           {}", insights.top_p);
    println!("  top_k:           {}", insights.top_k);
    println!("  num_predict:     {}", insights.num_predict);
    println!("  stop:            {:?}", insights.stop);
    println!("  window:          {}", insights.transaction_window);
    println!();

    println!("Prompts:\n");
    println!("{:<25} {:>7}  {:<15}  {}", "ID", "VERSION", "TASK TYPE", "OVERRIDE");
    println!("{}", "-".repeat(70));
    for info in prompts.list() {
        let status = match &info.override_path {
            Some(path) => format!("✓ {}", path.display()),
            None => "Default".to_string(),
        };
        println!(
            "{:<25} {:>7}  {:<15}  {}",
            info.id, info.version, info.task_type, status
        );
    }
    println!();
    println!(
        "Override directory: {}",
        prompts
            .override_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    Ok(())
}
