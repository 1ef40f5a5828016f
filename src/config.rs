//! Configuration management for Chatgate
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Chatgate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Inference daemon settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Conversation storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `index.html` and the client assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Inference daemon (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Daemon base URL; API paths are resolved under `<base_url>/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for buffered GET calls (seconds)
    #[serde(default = "default_get_timeout")]
    pub get_timeout_seconds: u64,

    /// Timeout for buffered POST calls (seconds)
    #[serde(default = "default_post_timeout")]
    pub post_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_get_timeout() -> u64 {
    60
}

fn default_post_timeout() -> u64 {
    180
}

impl UpstreamConfig {
    /// Timeout applied to `GET` calls
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.get_timeout_seconds)
    }

    /// Timeout applied to buffered `POST` calls
    pub fn post_timeout(&self) -> Duration {
        Duration::from_secs(self.post_timeout_seconds)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            get_timeout_seconds: default_get_timeout(),
            post_timeout_seconds: default_post_timeout(),
        }
    }
}

/// Conversation storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `conversations.json` and `conversations/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            self.upstream.base_url = base_url;
        }

        if let Ok(bind) = std::env::var("CHATGATE_BIND") {
            self.server.bind = bind;
        }

        if let Ok(port) = std::env::var("CHATGATE_PORT") {
            match port.parse() {
                Ok(value) => self.server.port = value,
                Err(_) => tracing::warn!("Ignoring invalid CHATGATE_PORT value: {}", port),
            }
        }

        if let Ok(data_dir) = std::env::var("CHATGATE_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(static_dir) = std::env::var("CHATGATE_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(static_dir);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(bind) = &cli.bind {
            self.server.bind = bind.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(url) = &cli.ollama_url {
            self.upstream.base_url = url.clone();
        }
        if let Some(dir) = &cli.data_dir {
            self.storage.data_dir = dir.clone();
        }
        if let Some(dir) = &cli.static_dir {
            self.server.static_dir = dir.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.upstream.base_url).map_err(|e| {
            GatewayError::Config(format!(
                "upstream.base_url is not a valid URL ({}): {}",
                self.upstream.base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "upstream.base_url must use http or https, got {}",
                base.scheme()
            ))
            .into());
        }

        if self.upstream.get_timeout_seconds == 0 || self.upstream.post_timeout_seconds == 0 {
            return Err(
                GatewayError::Config("upstream timeouts must be greater than 0".to_string()).into(),
            );
        }

        if self.server.port == 0 {
            return Err(GatewayError::Config("server.port must not be 0".to_string()).into());
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(
                GatewayError::Config("storage.data_dir cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream.base_url, "http://localhost:11434");
        assert_eq!(config.upstream.get_timeout(), Duration::from_secs(60));
        assert_eq!(config.upstream.post_timeout(), Duration::from_secs(180));
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_base_url() {
        let mut config = Config::default();
        config.upstream.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.upstream.base_url = "ftp://localhost:11434".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.upstream.post_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  bind: 0.0.0.0
  port: 8080
upstream:
  base_url: http://gpu-box:11434
  post_timeout_seconds: 600
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.upstream.base_url, "http://gpu-box:11434");
        assert_eq!(config.upstream.get_timeout_seconds, 60);
        assert_eq!(config.upstream.post_timeout_seconds, 600);
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        std::env::remove_var("OLLAMA_BASE_URL");
        let config = Config::load("nonexistent.yaml", &Cli::default()).unwrap();
        assert_eq!(config.upstream.base_url, "http://localhost:11434");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_base_url() {
        std::env::set_var("OLLAMA_BASE_URL", "http://10.0.0.5:11434");
        std::env::set_var("CHATGATE_PORT", "9123");

        let mut config = Config::default();
        config.apply_env_vars();

        std::env::remove_var("OLLAMA_BASE_URL");
        std::env::remove_var("CHATGATE_PORT");

        assert_eq!(config.upstream.base_url, "http://10.0.0.5:11434");
        assert_eq!(config.server.port, 9123);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_take_precedence_over_env() {
        std::env::set_var("OLLAMA_BASE_URL", "http://from-env:11434");
        let cli = Cli {
            ollama_url: Some("http://from-cli:11434".to_string()),
            port: Some(7000),
            ..Cli::default()
        };

        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        std::env::remove_var("OLLAMA_BASE_URL");

        assert_eq!(config.upstream.base_url, "http://from-cli:11434");
        assert_eq!(config.server.port, 7000);
    }
}
