//! Configuration module.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, ConfigError, ConfigFile,
    ResolvedConfig,
};

/// Resolve the full configuration: defaults, then the config file, then
/// environment overrides. CLI overrides are applied by the caller.
///
/// # Errors
///
/// Returns `ConfigError` if a config file exists but is invalid, or an
/// environment override cannot be parsed.
pub fn resolve(config_path: Option<std::path::PathBuf>) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    apply_env_overrides(merge_config(file))
}
