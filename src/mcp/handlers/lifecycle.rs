//! Session lifecycle: initialisation, liveness and logging control.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::McpError;
use crate::mcp::dispatcher::{HandlerResult, MethodHandler, RequestContext};
use crate::mcp::protocol::{Message, RequestId, MCP_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
use crate::mcp::session::{ClientInfo, LoggingLevel};

use super::{params, to_result};

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Result of the initialize request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub tools: ListCapability,
    pub resources: ResourceCapability,
    pub prompts: ListCapability,
    pub logging: Map<String, Value>,
    pub completions: Map<String, Value>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: ListCapability { list_changed: true },
            resources: ResourceCapability {
                subscribe: true,
                list_changed: true,
            },
            prompts: ListCapability { list_changed: true },
            logging: Map::new(),
            completions: Map::new(),
        }
    }
}

/// Capability of a collection whose contents may change.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCapability {
    pub list_changed: bool,
}

/// Resource-specific capabilities.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCapability {
    pub subscribe: bool,
    pub list_changed: bool,
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Picks the version to speak: the client's if supported, else the latest.
#[must_use]
pub fn negotiate_version(requested: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|supported| **supported == requested)
        .copied()
        .unwrap_or(MCP_PROTOCOL_VERSION)
}

/// `initialize`
#[derive(Debug, Clone, Copy)]
pub struct Initialize;

impl MethodHandler for Initialize {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("initialize")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        if context.session.is_negotiated() {
            return Err(McpError::InvalidRequest(
                "Server already initialised".to_string(),
            ));
        }

        let params: InitializeParams = params(message)?;
        let version = negotiate_version(&params.protocol_version);
        if version != params.protocol_version {
            tracing::info!(
                requested = %params.protocol_version,
                negotiated = version,
                "Client requested unsupported protocol version"
            );
        }
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                session = %context.session.id(),
                "Client connected"
            );
        }

        context
            .session
            .begin(version.to_string(), params.client_info);

        let settings = context.settings;
        let result = InitializeResult {
            protocol_version: version.to_string(),
            capabilities: ServerCapabilities::default(),
            server_info: ServerInfo {
                name: settings.name.clone(),
                version: settings.version.clone(),
            },
            instructions: settings.instructions.clone(),
        };
        to_result(&result).map(Some)
    }
}

/// `notifications/initialized`
#[derive(Debug, Clone, Copy)]
pub struct Initialized;

impl MethodHandler for Initialized {
    fn supports(&self, message: &Message) -> bool {
        message.is_notification_for("notifications/initialized")
    }

    fn handle(&self, _message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        if !context.session.is_negotiated() {
            tracing::warn!("Received initialized notification before initialize");
        }
        context.session.mark_initialized();
        tracing::info!(
            session = %context.session.id(),
            protocol = context.session.protocol_version().unwrap_or("unnegotiated"),
            "Session initialised"
        );
        Ok(None)
    }
}

/// `ping`
#[derive(Debug, Clone, Copy)]
pub struct Ping;

impl MethodHandler for Ping {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("ping")
    }

    fn handle(&self, _message: &Message, _context: &mut RequestContext<'_>) -> HandlerResult {
        Ok(Some(Map::new()))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SetLevelParams {
    level: LoggingLevel,
}

/// `logging/setLevel`
#[derive(Debug, Clone, Copy)]
pub struct SetLevel;

impl MethodHandler for SetLevel {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("logging/setLevel")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let SetLevelParams { level } = params(message)?;
        tracing::debug!(?level, "Client log level changed");
        context.session.set_log_level(level);
        Ok(Some(Map::new()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelledParams {
    request_id: RequestId,
    #[serde(default)]
    reason: Option<String>,
}

/// `notifications/cancelled`
///
/// Requests are answered synchronously, so by the time a cancellation
/// arrives the request has already completed. The notice is only logged.
#[derive(Debug, Clone, Copy)]
pub struct Cancelled;

impl MethodHandler for Cancelled {
    fn supports(&self, message: &Message) -> bool {
        message.is_notification_for("notifications/cancelled")
    }

    fn handle(&self, message: &Message, _context: &mut RequestContext<'_>) -> HandlerResult {
        let CancelledParams { request_id, reason } = params(message)?;
        tracing::info!(
            id = %request_id,
            reason = reason.as_deref().unwrap_or(""),
            "Client cancelled request"
        );
        Ok(None)
    }
}
