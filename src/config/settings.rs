//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::manifest::Manifest;
use crate::mcp::protocol::SERVER_NAME;
use crate::mcp::server::DEFAULT_PAGE_SIZE;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Server identity.
    #[serde(default)]
    pub server: ServerConfig,

    /// Listing page limits.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Capabilities registered at startup.
    #[serde(default)]
    pub manifest: Manifest,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pagination.page_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "pagination.page_size must be at least 1".to_string(),
            });
        }
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "server.name must not be empty".to_string(),
            });
        }
        self.manifest
            .validate()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("invalid manifest: {e}"),
            })
    }
}

/// Server identity reported by `initialize`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Server name. Default: the crate name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Server version. Default: the crate version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Usage hints for clients.
    #[serde(default)]
    pub instructions: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            instructions: None,
        }
    }
}

fn default_name() -> String {
    SERVER_NAME.to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Pagination configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Entries per listing page.
    /// Default: 50
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
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
    "warn".to_string()
}
