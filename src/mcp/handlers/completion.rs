//! `completion/complete`.

use serde::{Deserialize, Serialize};

use crate::mcp::dispatcher::{HandlerResult, MethodHandler, RequestContext};
use crate::mcp::protocol::Message;
use crate::registry::{Completion, CompletionReference};

use super::{params, to_result};

/// The argument being completed.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionArgument {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Parameters for `completion/complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteParams {
    #[serde(rename = "ref")]
    pub reference: CompletionReference,
    pub argument: CompletionArgument,
}

#[derive(Debug, Serialize)]
struct CompleteResult {
    completion: Completion,
}

/// `completion/complete`
#[derive(Debug, Clone, Copy)]
pub struct Complete;

impl MethodHandler for Complete {
    fn supports(&self, message: &Message) -> bool {
        message.is_request_for("completion/complete")
    }

    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult {
        let CompleteParams {
            reference,
            argument,
        } = params(message)?;
        let completion = context
            .registry
            .complete(&reference, &argument.name, &argument.value)?;
        to_result(&CompleteResult { completion }).map(Some)
    }
}
