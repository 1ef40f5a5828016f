//! Logging setup for the gateway
//!
//! Provides JSON-formatted and human-readable logging with optional file
//! output. `RUST_LOG` always wins over the level chosen on the command line.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options resolved from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,
    /// Optional file that receives a copy of every log line
    pub file_path: Option<PathBuf>,
}

impl LoggingOptions {
    /// Build options from the CLI flags
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        let level = if cli.verbose {
            "chatgate=debug,tower_http=debug"
        } else {
            "chatgate=info,tower_http=info"
        };

        Self {
            level: level.to_string(),
            json_format: cli.json_logs,
            file_path: cli.log_file.clone(),
        }
    }
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "chatgate=info,tower_http=info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or the log file
/// cannot be opened.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&options.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &options.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if options.json_format {
        let stdout_layer = fmt::layer().json().with_current_span(true);
        let file_layer = file.map(|f| fmt::layer().json().with_current_span(true).with_writer(f));
        registry.with(stdout_layer).with(file_layer).init();
    } else {
        let stdout_layer = fmt::layer().with_target(true).with_level(true);
        let file_layer = file.map(|f| {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(f)
        });
        registry.with(stdout_layer).with(file_layer).init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    #[test]
    fn test_logging_options_default() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "chatgate=info,tower_http=info");
        assert!(!options.json_format);
        assert!(options.file_path.is_none());
    }

    #[test]
    fn test_logging_options_from_verbose_cli() {
        let cli = Cli {
            verbose: true,
            json_logs: true,
            log_file: Some(PathBuf::from("/tmp/chatgate.log")),
            ..Cli::default()
        };

        let options = LoggingOptions::from_cli(&cli);
        assert_eq!(options.level, "chatgate=debug,tower_http=debug");
        assert!(options.json_format);
        assert_eq!(options.file_path, Some(PathBuf::from("/tmp/chatgate.log")));
    }

    #[test]
    fn test_logging_level_directive_parses() {
        let options = LoggingOptions::default();
        assert!(EnvFilter::try_new(&options.level).is_ok());
    }
}
