//! Command-line interface definition for Chatgate
//!
//! This module defines the CLI structure using clap's derive API. Every
//! flag is optional and overrides the matching configuration value.

use clap::Parser;
use std::path::PathBuf;

/// Chatgate - local gateway between a chat client and Ollama
///
/// Proxies model, pull, chat and generate requests to the inference
/// daemon and stores conversation transcripts on disk.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "chatgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the Ollama daemon
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Directory holding the conversation index and documents
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding the static web client
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
