//! Configuration management for scrollex
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export pipeline configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Output layout configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Hostname and port of the Elasticsearch index
    #[serde(default = "default_host")]
    pub host: String,

    /// Scroll cursor validity window, refreshed on every advance
    #[serde(default = "default_scroll_window")]
    pub scroll_window: String,
}

/// Export pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Number of hits requested per scroll page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Number of documents processed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// CSS selector for the article body fragment
    #[serde(default = "default_article_body_selector")]
    pub article_body_selector: String,
}

/// Output layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory; files land under `<directory>/<index>/`
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    /// Overwrite an existing file at a derived path (last writer wins).
    /// When false, colliding documents are skipped instead.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
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
fn default_host() -> String {
    "crawled.content.infospace.com:9200".to_string()
}

fn default_scroll_window() -> String {
    "30s".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_concurrency() -> usize {
    5
}

fn default_article_body_selector() -> String {
    "body".to_string()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("./output")
}

fn default_overwrite() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            export: ExportConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            scroll_window: default_scroll_window(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            article_body_selector: default_article_body_selector(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            overwrite: default_overwrite(),
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

    /// Load configuration from a file, or defaults when no file exists
    ///
    /// An explicitly requested file that is missing is an error; a missing
    /// file at the default location silently yields the default config.
    ///
    /// # Arguments
    /// * `path` - Explicit config file path, or None for the default location
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::FileNotFound(p.display().to_string()).into());
                }
                Self::parse_file(p)
            }
            None => {
                let p = Self::default_config_path();
                if p.exists() {
                    Self::parse_file(&p)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".scrollex")
            .join("config.toml")
    }

    /// Save configuration to a file
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Serialize the configuration as a TOML document
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// Checks everything that would otherwise fail mid-export: a zero page
    /// size or concurrency, a selector that does not parse, and a malformed
    /// scroll window. All of these abort before any network traffic.
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.export.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.page_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if self.export.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.concurrency".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        scraper::Selector::parse(&self.export.article_body_selector)
            .map_err(|e| ConfigError::InvalidSelector(e.to_string()))?;

        if !is_valid_scroll_window(&self.connection.scroll_window) {
            return Err(
                ConfigError::InvalidWindow(self.connection.scroll_window.clone()).into(),
            );
        }

        Ok(())
    }
}

/// Check a scroll window duration string (e.g. "30s", "500ms", "2m")
///
/// The accepted shape matches what Elasticsearch accepts for the `scroll`
/// parameter: an integer followed by one of the time units ms/s/m/h/d.
pub fn is_valid_scroll_window(window: &str) -> bool {
    let digits = if let Some(d) = window.strip_suffix("ms") {
        d
    } else if let Some(d) = window
        .strip_suffix('s')
        .or_else(|| window.strip_suffix('m'))
        .or_else(|| window.strip_suffix('h'))
        .or_else(|| window.strip_suffix('d'))
    {
        d
    } else {
        return false;
    };

    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
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
