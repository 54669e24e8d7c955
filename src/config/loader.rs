//! Configuration file loading with precedence handling.

use crate::model::LogLevel;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "XLOGVIEW_CONFIG";

/// Environment variable overriding the default filter level.
pub const LEVEL_ENV: &str = "XLOGVIEW_LEVEL";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, is a directory, ...).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown fields.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// An environment override holds a value that cannot be used.
    #[error("Invalid value {value:?} in ${var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/xlogview/config.toml`.
///
/// Decryption keys are intentionally not configurable: they live in memory only.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Minimum level shown when a file is opened.
    #[serde(default)]
    pub default_level: Option<LogLevel>,

    /// Directory opened at startup when none is given.
    #[serde(default)]
    pub start_directory: Option<PathBuf>,

    /// Run scans, decodes and exports on worker threads.
    #[serde(default)]
    pub background: Option<bool>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Initial filter level.
    pub default_level: LogLevel,
    /// Directory to open at startup, if any.
    pub start_directory: Option<PathBuf>,
    /// Dispatch collaborator calls in the background.
    pub background: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            log_file_path: default_log_path(),
            default_level: LogLevel::Verbose,
            start_directory: None,
            background: false,
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/xlogview/xlogview.log` on Linux, or the platform
/// equivalent. Falls back to the current directory when no state directory
/// exists (macOS and Windows have none).
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("xlogview").join("xlogview.log")
    } else {
        PathBuf::from("xlogview.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/xlogview/config.toml` on Unix, appropriate path on other
/// platforms, or `None` if no config directory can be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("xlogview").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `XLOGVIEW_CONFIG` environment variable
/// 3. Default path `~/.config/xlogview/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
        default_level: config.default_level.unwrap_or(defaults.default_level),
        start_directory: config.start_directory.or(defaults.start_directory),
        background: config.background.unwrap_or(defaults.background),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `XLOGVIEW_LEVEL`: Override default filter level (name or marker letter)
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnv` if the level cannot be parsed.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(level) = std::env::var(LEVEL_ENV) {
        config.default_level = level.parse().map_err(|_| ConfigError::InvalidEnv {
            var: LEVEL_ENV,
            value: level.clone(),
        })?;
    }

    Ok(config)
}

/// Apply CLI argument overrides to resolved config.
///
/// CLI args have the highest precedence and override all other sources.
/// Only applies overrides for flags that were explicitly set by the user.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    level_override: Option<LogLevel>,
    background_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(level) = level_override {
        config.default_level = level;
    }

    if let Some(background) = background_override {
        config.background = background;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
