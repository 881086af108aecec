//! `tools/list` and `tools/call`.

use serde::{Deserialize, Serialize};

use crate::error::McpError;
use crate::mcp::dispatcher::{HandlerResult, MethodHandler, RequestContext};
use crate::mcp::protocol::Message;
use crate::model::{Content, Tool};
use crate::registry::Arguments;

use super::{params, to_result, ListParams};

/// Result of `tools/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult<'a> {
    pub tools: Vec<&'a Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool; absent and `null` both mean none.
    #[serde(default)]
    pub arguments: Option<Arguments>,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content items produced by the tool.
    pub content: Vec<Content>,
    /// Whether the tool reported a domain-level failure.
    pub is_error: bool,
}

/// `tools/list`
#[derive(Debug, Clone, Copy)]
pub struct ListTools;

impl MethodHandler for ListTools {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("tools/list")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let ListParams { cursor } = params(message)?;
        let page = context
            .registry
            .list_tools(cursor.as_deref(), context.settings.page_size)?;
        to_result(&ListToolsResult {
            tools: page.items,
            next_cursor: page.next_cursor,
        })
        .map(Some)
    }
}

/// `tools/call`
#[derive(Debug, Clone, Copy)]
pub struct CallTool;

impl MethodHandler for CallTool {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("tools/call")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let CallToolParams { name, arguments } = params(message)?;
        let tool = context
            .registry
            .get_tool(&name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown tool: {name}")))?;

        tracing::debug!(tool = %name, "Calling tool");
        let content = tool.call(arguments.unwrap_or_default())?;
        to_result(&CallToolResult {
            content,
            is_error: false,
        })
        .map(Some)
    }
}
