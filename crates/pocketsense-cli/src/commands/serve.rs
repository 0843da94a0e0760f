//! Server command implementation

use std::path::Path;

use anyhow::Result;
use pocketsense_server::ServerConfig;

use super::open_pipeline;

pub async fn cmd_serve(config_path: Option<&Path>, host: &str, port: u16) -> Result<()> {
    let pipeline = open_pipeline(config_path)?;
    let server_config = ServerConfig::from_env();

    println!("🚀 Starting PocketSense API server...");
    println!("   Listening: http://{}:{}", host, port);
    println!(
        "   Backend: {} ({}, model: {})",
        pipeline.config().backend,
        pipeline.client().host(),
        pipeline.client().model()
    );
    if server_config.allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", server_config.allowed_origins.join(", "));
    }
    println!();

    pocketsense_server::serve(pipeline, host, port, server_config).await
}
