//! Error types for capability-mcp.
//!
//! Protocol-level failures are collected in [`McpError`], whose variants map
//! one-to-one onto JSON-RPC error codes. Handler authors return
//! [`HandlerError`]; definition constructors return [`DefinitionError`].

use std::path::PathBuf;

use thiserror::Error;

use crate::mcp::protocol::ErrorCode;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// A capability definition failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// Tool, prompt or resource name does not match the allowed pattern.
    #[error("invalid name '{name}': only letters, digits, '_' and '-' are allowed")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// Tool input schema is not a JSON-Schema object of `type: object`.
    #[error("input schema of tool '{tool}' must be an object with \"type\": \"object\"")]
    InvalidInputSchema {
        /// The tool the schema belongs to.
        tool: String,
    },

    /// Resource URI is missing a scheme.
    #[error("invalid resource URI '{uri}': expected scheme://path")]
    InvalidUri {
        /// The rejected URI.
        uri: String,
    },

    /// Resource template is malformed.
    #[error("invalid resource template '{template}': {reason}")]
    InvalidTemplate {
        /// The rejected URI template.
        template: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Failure reported by a capability handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler rejected its arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The handler's own logic failed.
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Wraps any error as a handler execution failure.
    pub fn failed(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(error.into())
    }
}

/// Protocol-level error raised while handling a message.
#[derive(Error, Debug)]
pub enum McpError {
    /// Raw input was not valid JSON.
    #[error("{0}")]
    Parse(String),

    /// Input was JSON but not a valid JSON-RPC message.
    #[error("{0}")]
    InvalidRequest(String),

    /// No handler supports the requested method, or the named tool/prompt is unknown.
    #[error("{0}")]
    MethodNotFound(String),

    /// Request parameters are missing or malformed.
    #[error("{0}")]
    InvalidParams(String),

    /// A pagination cursor matched no known entry.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// A resource URI matched no resource or template.
    #[error("{0}")]
    ResourceNotFound(String),

    /// A handler's return value could not be converted to protocol content.
    #[error("failed to format result: {0}")]
    Formatting(String),

    /// A handler failed while executing.
    #[error("{context}")]
    Handler {
        /// What was being executed.
        context: String,
        /// The handler's failure.
        #[source]
        source: HandlerError,
    },

    /// Unexpected internal failure.
    #[error("{0}")]
    Internal(String),
}

impl McpError {
    /// Returns the JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ParseError,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
            Self::MethodNotFound(_) => ErrorCode::MethodNotFound,
            Self::InvalidParams(_)
            | Self::InvalidCursor(_)
            | Self::Handler {
                source: HandlerError::InvalidArguments(_),
                ..
            } => ErrorCode::InvalidParams,
            Self::ResourceNotFound(_) => ErrorCode::ResourceNotFound,
            Self::Formatting(_) | Self::Handler { .. } | Self::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Wraps a handler failure with a description of what was running.
    pub fn handler(context: impl Into<String>, source: HandlerError) -> Self {
        Self::Handler {
            context: context.into(),
            source,
        }
    }

    /// The message sent to the client.
    ///
    /// Handler execution failures only expose the context; the cause stays in
    /// the server log.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Handler {
                context,
                source: HandlerError::InvalidArguments(reason),
            } => format!("{context}: {reason}"),
            _ => self.to_string(),
        }
    }
}

impl From<DefinitionError> for McpError {
    fn from(error: DefinitionError) -> Self {
        Self::InvalidParams(error.to_string())
    }
}
