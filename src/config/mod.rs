//! Configuration management for cql-pager
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments (applied by the CLI)
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Environment variable overriding `cursor.page_size`
pub const PAGE_SIZE_ENV: &str = "CQL_PAGER_PAGE_SIZE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cursor and paging configuration
    #[serde(default)]
    pub cursor: CursorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cursor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Rows per page requested from the source
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Retrieval requests that may wait in a cursor's queue
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,

    /// Rows requested per round when streaming a result
    #[serde(default = "default_stream_batch")]
    pub stream_batch: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_page_size() -> u32 {
    100
}

fn default_queue_depth() -> usize {
    32
}

fn default_stream_batch() -> usize {
    100
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            queue_depth: default_queue_depth(),
            stream_batch: default_stream_batch(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.display().to_string()),
            _ => ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from an explicit file, or from the default path
    ///
    /// An explicit path must exist. A missing default file yields the
    /// default configuration. Environment overrides are applied last.
    ///
    /// # Arguments
    /// * `path` - Optional path given on the command line
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// `CQL_PAGER_PAGE_SIZE` replaces `cursor.page_size`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(PAGE_SIZE_ENV) {
            self.cursor.page_size = parse_page_size(PAGE_SIZE_ENV, &value)?;
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".cql-pager")
            .join("config.toml")
    }

    /// Serialize the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.cursor.page_size == 0 {
            return Err(invalid("cursor.page_size", 0).into());
        }
        if self.cursor.queue_depth == 0 {
            return Err(invalid("cursor.queue_depth", 0).into());
        }
        if self.cursor.stream_batch == 0 {
            return Err(invalid("cursor.stream_batch", 0).into());
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_page_size(field: &str, value: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(invalid(field, value).into()),
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cursor.page_size, 100);
        assert_eq!(config.cursor.queue_depth, 32);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [cursor]
            page_size = 3

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.cursor.page_size, 3);
        assert_eq!(config.cursor.stream_batch, 100);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[cursor]\npage_size = \"many\"");
        assert!(matches!(
            result,
            Err(crate::error::PagerError::Config(ConfigError::InvalidFormat(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        let mut config = Config::default();
        config.cursor.queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip_keeps_values() {
        let mut config = Config::default();
        config.cursor.page_size = 7;
        let text = config.to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.cursor.page_size, 7);
    }

    #[test]
    fn test_explicit_missing_file() {
        let result = Config::load_from_file(Some(Path::new("/nonexistent/cql-pager.toml")));
        assert!(matches!(
            result,
            Err(crate::error::PagerError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size(PAGE_SIZE_ENV, " 25 ").unwrap(), 25);
        assert!(parse_page_size(PAGE_SIZE_ENV, "0").is_err());
        assert!(parse_page_size(PAGE_SIZE_ENV, "lots").is_err());
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }
}
