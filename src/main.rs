//! Chatgate - local gateway between a chat client and Ollama
//!
#![doc = "Main entry point for the Chatgate server."]

use anyhow::Result;

use chatgate::cli::Cli;
use chatgate::config::Config;
use chatgate::logging::{init_logging, LoggingOptions};
use chatgate::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_logging(&LoggingOptions::from_cli(&cli))?;

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    tracing::info!(
        "Starting chatgate {} on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.bind,
        config.server.port
    );

    server::run(config).await
}
