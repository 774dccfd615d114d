//! Configuration loading and discovery for `itematlas.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::AtlasToolConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for
pub const CONFIG_FILE_NAME: &str = "itematlas.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse itematlas.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override tile size
    pub tile_size: Option<u32>,
    /// Override worker count
    pub workers: Option<usize>,
}

/// Find itematlas.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate configuration from an itematlas.toml file.
///
/// Callers fall back to `default_config()` when no file was found.
///
/// # Example
/// ```ignore
/// let config = match find_config_from(root.to_path_buf()) {
///     Some(path) => load_config(&path)?,
///     None => default_config(),
/// };
/// ```
pub fn load_config(path: &Path) -> Result<AtlasToolConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AtlasToolConfig = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Turn validation problems into a `ConfigError`.
pub fn validate_config(config: &AtlasToolConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()))
    }
}

/// Configuration used when no itematlas.toml is found.
pub fn default_config() -> AtlasToolConfig {
    AtlasToolConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values. The result should
/// be validated again, since an override can be out of range.
pub fn merge_cli_overrides(config: &mut AtlasToolConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.output.dir = out.clone();
    }

    if let Some(tile_size) = overrides.tile_size {
        config.atlas.tile_size = tile_size;
    }

    if let Some(workers) = overrides.workers {
        config.atlas.workers = workers;
    }
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}
