//! Configuration loading and config file resolution
//!
//! Resolution priority for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `ARV_CONFIG` environment variable
//! 3. `<config_dir>/arv/config.toml`
//! 4. Compiled defaults (no file)

use crate::models::FileType;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ARV_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Materialization engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// When false, telemetry fetches return empty results without calling the provider
    #[serde(default = "default_true")]
    pub telemetry_enabled: bool,

    /// Material file types counted as scorable in completion rates
    #[serde(default = "default_scorable_file_types")]
    pub scorable_file_types: Vec<FileType>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            telemetry_enabled: true,
            scorable_file_types: default_scorable_file_types(),
        }
    }
}

impl EngineConfig {
    pub fn is_scorable(&self, file_type: FileType) -> bool {
        self.scorable_file_types.contains(&file_type)
    }
}

fn default_true() -> bool {
    true
}

fn default_scorable_file_types() -> Vec<FileType> {
    vec![FileType::H5p]
}

/// Resolve which config file to read, if any
///
/// Returns `None` when no source names a file and no default file exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("arv").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load configuration from a TOML file
///
/// A missing file yields defaults with a warning; a malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Load configuration following the resolution priority
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => load_toml_config(&path),
        None => Ok(TomlConfig::default()),
    }
}

/// Write configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.engine.telemetry_enabled);
        assert!(config.engine.is_scorable(FileType::H5p));
        assert!(!config.engine.is_scorable(FileType::Video));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str("[engine]\ntelemetry_enabled = false\n").unwrap();
        assert!(!config.engine.telemetry_enabled);
        assert_eq!(config.engine.scorable_file_types, vec![FileType::H5p]);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_cli_arg_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
