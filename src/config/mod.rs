//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the CLI argument (must exist)
//! 2. Default location, used only if present:
//!    - **Linux/macOS:** `~/.capability-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.capability-mcp\config.json`
//!
//! Without either, built-in defaults apply.
//!
//! # Example Configuration
//!
//! See `config/example-config.json` for a complete example.

mod settings;

pub use settings::{Config, LoggingConfig, PaginationConfig, ServerConfig};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.capability-mcp/`
/// - **Windows:** `%USERPROFILE%\.capability-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".capability-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file.
///
/// If `path` is `None`, uses the platform-specific default location, falling
/// back to [`Config::default`] when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given file does not exist
/// - The file cannot be read
/// - The JSON is malformed
/// - Fields are invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            p.to_path_buf()
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No configuration file found, using defaults");
                return Ok(Config::default());
            }
        },
    };

    load_file(&config_path)
}

fn load_file(config_path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    config.validate()?;

    Ok(config)
}
