//! `prompts/list` and `prompts/get`.

use serde::{Deserialize, Serialize};

use crate::error::McpError;
use crate::mcp::dispatcher::{HandlerResult, MethodHandler, RequestContext};
use crate::mcp::protocol::Message;
use crate::model::{Prompt, PromptMessage};
use crate::registry::Arguments;

use super::{params, to_result, ListParams};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListPromptsResult<'a> {
    prompts: Vec<&'a Prompt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

/// Parameters for `prompts/get`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetPromptParams {
    pub name: String,
    /// Prompt arguments; absent and `null` both mean none.
    #[serde(default)]
    pub arguments: Option<Arguments>,
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, Serialize)]
pub struct GetPromptResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

/// `prompts/list`
#[derive(Debug, Clone, Copy)]
pub struct ListPrompts;

impl MethodHandler for ListPrompts {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("prompts/list")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let ListParams { cursor } = params(message)?;
        let page = context
            .registry
            .list_prompts(cursor.as_deref(), context.settings.page_size)?;
        to_result(&ListPromptsResult {
            prompts: page.items,
            next_cursor: page.next_cursor,
        })
        .map(Some)
    }
}

/// `prompts/get`
#[derive(Debug, Clone, Copy)]
pub struct GetPrompt;

impl MethodHandler for GetPrompt {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("prompts/get")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let GetPromptParams { name, arguments } = params(message)?;
        let prompt = context
            .registry
            .get_prompt(&name)
            .ok_or_else(|| McpError::MethodNotFound(format!("Unknown prompt: {name}")))?;

        tracing::debug!(prompt = %name, "Rendering prompt");
        let messages = prompt.get(&arguments.unwrap_or_default())?;
        to_result(&GetPromptResult {
            description: prompt.prompt.description.clone(),
            messages,
        })
        .map(Some)
    }
}
