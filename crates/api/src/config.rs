//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file (`focus.toml`, or the path in `FOCUS_CONFIG`), then `FOCUS__*`
//! environment variables (`FOCUS__SERVER__BIND_ADDR=0.0.0.0:9000`,
//! `FOCUS__ENGINE__COUNTDOWN__SESSION_LENGTH_SECS=600`).

use config::{Config, ConfigError, Environment, File};
use focus_engine::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitConfig;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "focus.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "FOCUS_CONFIG";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// `None` disables throttling of control routes
    pub rate_limit: Option<RateLimitConfig>,
    /// trace | debug | info | warn | error
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            rate_limit: Some(RateLimitConfig::default()),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Scripted inputs for the demo binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Windows reported as open; the first one starts focused
    pub windows: Vec<String>,
    /// Switch the foreground window this often (0 = never)
    pub rotate_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            windows: vec![
                "Editor".to_string(),
                "Inbox - Google Chrome".to_string(),
                "Terminal".to_string(),
            ],
            rotate_secs: 20,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub demo: DemoConfig,
}

impl AppConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (optional) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FOCUS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist.toml").unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.engine.countdown.session_length_secs, 1500);
        assert_eq!(config.demo.windows.len(), 3);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let raw = r#"
            [server]
            bind_addr = "0.0.0.0:9000"

            [engine.countdown]
            session_length_secs = 600

            [engine.sampler]
            max_rate_hz = 10.0
        "#;
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.engine.countdown.session_length_secs, 600);
        assert_eq!(config.engine.countdown.tick_interval_ms, 1000);
        assert_eq!(config.engine.sampler.max_rate_hz, 10.0);
        assert_eq!(config.engine.sampler.max_consecutive_failures, 3);
        assert!(config.engine.validate().is_ok());
    }
}
