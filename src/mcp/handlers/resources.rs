//! Resource listing, reading and subscriptions.

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::error::McpError;
use crate::mcp::dispatcher::{HandlerResult, MethodHandler, RequestContext};
use crate::mcp::protocol::Message;
use crate::model::{Resource, ResourceContents, ResourceTemplate};

use super::{params, to_result, ListParams};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResourcesResult<'a> {
    resources: Vec<&'a Resource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListTemplatesResult<'a> {
    resource_templates: Vec<&'a ResourceTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<String>,
}

/// Parameters naming a single resource URI.
#[derive(Debug, Clone, Deserialize)]
pub struct UriParams {
    pub uri: String,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Serialize)]
pub struct ReadResourceResult {
    pub contents: Vec<ResourceContents>,
}

fn not_found(uri: &str) -> McpError {
    McpError::ResourceNotFound(format!("Resource not found: {uri}"))
}

/// `resources/list`
#[derive(Debug, Clone, Copy)]
pub struct ListResources;

impl MethodHandler for ListResources {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("resources/list")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let ListParams { cursor } = params(message)?;
        let page = context
            .registry
            .list_resources(cursor.as_deref(), context.settings.page_size)?;
        to_result(&ListResourcesResult {
            resources: page.items,
            next_cursor: page.next_cursor,
        })
        .map(Some)
    }
}

/// `resources/templates/list`
#[derive(Debug, Clone, Copy)]
pub struct ListTemplates;

impl MethodHandler for ListTemplates {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("resources/templates/list")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let ListParams { cursor } = params(message)?;
        let page = context
            .registry
            .list_resource_templates(cursor.as_deref(), context.settings.page_size)?;
        to_result(&ListTemplatesResult {
            resource_templates: page.items,
            next_cursor: page.next_cursor,
        })
        .map(Some)
    }
}

/// `resources/read`
#[derive(Debug, Clone, Copy)]
pub struct ReadResource;

impl MethodHandler for ReadResource {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("resources/read")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let UriParams { uri } = params(message)?;
        let resolved = context
            .registry
            .get_resource(&uri, true)
            .ok_or_else(|| not_found(&uri))?;

        tracing::debug!(uri = %uri, "Reading resource");
        let contents = resolved.read(&uri)?;
        to_result(&ReadResourceResult { contents }).map(Some)
    }
}

/// `resources/subscribe`
#[derive(Debug, Clone, Copy)]
pub struct Subscribe;

impl MethodHandler for Subscribe {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("resources/subscribe")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let UriParams { uri } = params(message)?;
        if context.registry.get_resource(&uri, true).is_none() {
            return Err(not_found(&uri));
        }
        if context.session.subscribe(uri.as_str()) {
            tracing::debug!(uri = %uri, "Subscribed to resource");
        }
        Ok(Some(Map::new()))
    }
}

/// `resources/unsubscribe`
#[derive(Debug, Clone, Copy)]
pub struct Unsubscribe;

impl MethodHandler for Unsubscribe {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("resources/unsubscribe")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let UriParams { uri } = params(message)?;
        if context.session.unsubscribe(&uri) {
            tracing::debug!(uri = %uri, "Unsubscribed from resource");
        }
        Ok(Some(Map::new()))
    }
}
