//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tsundoku/insights.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/tsundoku/` (~/.config/tsundoku/)
//! - Data: `$XDG_DATA_HOME/tsundoku/` (~/.local/share/tsundoku/)
//! - State/Logs: `$XDG_STATE_HOME/tsundoku/` (~/.local/state/tsundoku/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analytics configuration
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// How many entries popularity rankings keep per entity kind
    #[serde(default = "default_top_limit")]
    pub top_limit: usize,

    /// Trailing window for the active-user metric, in days
    #[serde(default = "default_active_user_window_days")]
    pub active_user_window_days: u32,

    /// List of disabled analyzers/identifiers, by name
    #[serde(default)]
    pub disabled_analyzers: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_limit: default_top_limit(),
            active_user_window_days: default_active_user_window_days(),
            disabled_analyzers: vec![],
        }
    }
}

fn default_top_limit() -> usize {
    10
}

fn default_active_user_window_days() -> u32 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/tsundoku/insights.toml` (~/.config/tsundoku/insights.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("tsundoku").join("insights.toml")
    }

    /// Returns the data directory path (for the SQLite database)
    ///
    /// `$XDG_DATA_HOME/tsundoku/` (~/.local/share/tsundoku/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("tsundoku")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/tsundoku/` (~/.local/state/tsundoku/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("tsundoku")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/tsundoku/insights.db` (~/.local/share/tsundoku/insights.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("insights.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/tsundoku/insights.log` (~/.local/state/tsundoku/insights.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("insights.log")
    }
}
