//! Built-in handlers for the MCP methods.
//!
//! | method                        | handler                        |
//! |-------------------------------|--------------------------------|
//! | `initialize`                  | [`lifecycle::Initialize`]      |
//! | `ping`                        | [`lifecycle::Ping`]            |
//! | `logging/setLevel`            | [`lifecycle::SetLevel`]        |
//! | `notifications/initialized`   | [`lifecycle::Initialized`]     |
//! | `notifications/cancelled`     | [`lifecycle::Cancelled`]       |
//! | `tools/list`                  | [`tools::ListTools`]           |
//! | `tools/call`                  | [`tools::CallTool`]            |
//! | `resources/list`              | [`resources::ListResources`]   |
//! | `resources/read`              | [`resources::ReadResource`]    |
//! | `resources/templates/list`    | [`resources::ListTemplates`]   |
//! | `resources/subscribe`         | [`resources::Subscribe`]       |
//! | `resources/unsubscribe`       | [`resources::Unsubscribe`]     |
//! | `prompts/list`                | [`prompts::ListPrompts`]       |
//! | `prompts/get`                 | [`prompts::GetPrompt`]         |
//! | `completion/complete`         | [`completion::Complete`]       |

pub mod completion;
pub mod lifecycle;
pub mod prompts;
pub mod resources;
pub mod tools;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::McpError;
use crate::mcp::dispatcher::MethodHandler;
use crate::mcp::protocol::Message;

/// The handlers installed by [`Dispatcher::new`](crate::mcp::dispatcher::Dispatcher::new).
#[must_use]
pub fn default_handlers() -> Vec<Box<dyn MethodHandler>> {
    vec![
        Box::new(lifecycle::Initialize),
        Box::new(lifecycle::Ping),
        Box::new(lifecycle::SetLevel),
        Box::new(lifecycle::Initialized),
        Box::new(lifecycle::Cancelled),
        Box::new(tools::ListTools),
        Box::new(tools::CallTool),
        Box::new(resources::ListResources),
        Box::new(resources::ReadResource),
        Box::new(resources::ListTemplates),
        Box::new(resources::Subscribe),
        Box::new(resources::Unsubscribe),
        Box::new(prompts::ListPrompts),
        Box::new(prompts::GetPrompt),
        Box::new(completion::Complete),
    ]
}

/// Parameters of the `*/list` methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    /// Cursor returned by the previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Decodes a message's params, treating absent params as `{}`.
pub(crate) fn params<T: DeserializeOwned>(message: &Message) -> Result<T, McpError> {
    let value = message
        .params()
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(value)
        .map_err(|e| McpError::InvalidParams(format!("Invalid params for {}: {e}", method(message))))
}

/// Serialises a result struct into a response result object.
pub(crate) fn to_result(result: &impl Serialize) -> Result<Map<String, Value>, McpError> {
    match serde_json::to_value(result) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(McpError::Internal(format!(
            "result serialised to a non-object: {other}"
        ))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialise result");
            Err(McpError::Internal(
                "Internal error: failed to serialise result".to_string(),
            ))
        }
    }
}

fn method(message: &Message) -> &str {
    message.method().unwrap_or("message")
}
