//! Health command implementation

use std::path::Path;

use anyhow::{bail, Result};

use super::open_pipeline;

/// Probe the configured backend; fails when it is not reachable
pub async fn cmd_health(config_path: Option<&Path>) -> Result<()> {
    let pipeline = open_pipeline(config_path)?;
    let client = pipeline.client();

    println!("🔍 Checking inference backend...\n");
    println!("  Backend: {}", pipeline.config().backend);
    println!("  Host:    {}", client.host());
    println!("  Model:   {}", client.model());
    println!();

    if pipeline.health().await.is_ready() {
        println!("✅ Connected");
        return Ok(());
    }

    println!("❌ Not responding");
    println!("\nTo set up Ollama:");
    println!("  1. Install Ollama: https://ollama.ai/download");
    println!("  2. Start the server: ollama serve");
    println!("  3. Pull the model: ollama pull {}", client.model());
    println!("  4. Point PocketSense at it: export OLLAMA_HOST={}", client.host());

    bail!("Inference backend at {} is not available", client.host())
}
