//! Routes decoded messages to method handlers.
//!
//! Handlers are consulted in order:
//!
//! - a **request** is answered by the first handler whose `supports` accepts
//!   it; a handler returning `Ok(None)` consumes the request without a reply;
//! - a **notification** is delivered to every supporting handler and never
//!   answered;
//! - incoming **responses** are ignored, since this server issues no requests.
//!
//! No failure escapes: every request yields a response or an error object.

use std::error::Error as _;

use serde_json::{Map, Value};

use crate::error::McpError;
use crate::mcp::handlers;
use crate::mcp::protocol::{parse_message, ErrorResponse, Message, Request, Response};
use crate::mcp::server::ServerSettings;
use crate::mcp::session::Session;
use crate::registry::Registry;

/// The result object of a successful request; `None` means "no reply".
pub type HandlerResult = Result<Option<Map<String, Value>>, McpError>;

/// Everything a handler may read or update while serving one message.
#[derive(Debug)]
pub struct RequestContext<'a> {
    /// Registered capabilities.
    pub registry: &'a Registry,
    /// The connection's session state.
    pub session: &'a mut Session,
    /// Server identity and listing limits.
    pub settings: &'a ServerSettings,
}

/// Handles one protocol method (or a family of them).
pub trait MethodHandler: Send + Sync {
    /// Whether this handler accepts `message`.
    fn supports(&self, message: &Message) -> bool;

    /// Handles a supported message.
    ///
    /// # Errors
    ///
    /// Any error is reported to the client with its JSON-RPC code.
    fn handle(&self, message: &Message, context: &mut RequestContext<'_>) -> HandlerResult;
}

/// Ordered collection of [`MethodHandler`]s.
pub struct Dispatcher {
    handlers: Vec<Box<dyn MethodHandler>>,
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in protocol handlers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: handlers::default_handlers(),
        }
    }

    /// Creates a dispatcher with no handlers.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler, consulted after all existing ones.
    pub fn add_handler(&mut self, handler: impl MethodHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Decodes and dispatches one line of input.
    pub fn process(&self, input: &str, context: &mut RequestContext<'_>) -> Option<Message> {
        match parse_message(input) {
            Ok(message) => self.dispatch(message, context),
            Err(error) => {
                tracing::warn!(
                    code = error.error.code,
                    message = %error.error.message,
                    "Rejected malformed message"
                );
                Some(error.into())
            }
        }
    }

    /// Dispatches a decoded message, returning the reply if one is due.
    pub fn dispatch(&self, message: Message, context: &mut RequestContext<'_>) -> Option<Message> {
        match message {
            Message::RequestBatch(items) => {
                let replies: Vec<Message> = items
                    .into_iter()
                    .filter_map(|item| self.dispatch(item, context))
                    .collect();
                if replies.is_empty() {
                    None
                } else {
                    Some(Message::ResponseBatch(replies))
                }
            }
            Message::Request(ref request) => self.handle_request(request, &message, context),
            Message::Notification(ref notification) => {
                self.handle_notification(&notification.method, &message, context);
                None
            }
            Message::Response(_) | Message::Error(_) | Message::ResponseBatch(_) => {
                tracing::debug!("Ignoring incoming response");
                None
            }
        }
    }

    fn handle_request(
        &self,
        request: &Request,
        message: &Message,
        context: &mut RequestContext<'_>,
    ) -> Option<Message> {
        let id = request.id.clone();
        let Some(handler) = self.handlers.iter().find(|h| h.supports(message)) else {
            tracing::debug!(method = %request.method, %id, "Method not found");
            return Some(ErrorResponse::method_not_found(id, &request.method).into());
        };

        tracing::debug!(method = %request.method, %id, "Handling request");
        match handler.handle(message, context) {
            Ok(Some(result)) => Some(Response::success(id, result).into()),
            Ok(None) => None,
            Err(error) => {
                log_failure(&request.method, &error);
                Some(ErrorResponse::from_error(id, &error).into())
            }
        }
    }

    fn handle_notification(&self, method: &str, message: &Message, context: &mut RequestContext<'_>) {
        let mut handled = false;
        for handler in self.handlers.iter().filter(|h| h.supports(message)) {
            handled = true;
            if let Err(error) = handler.handle(message, context) {
                log_failure(method, &error);
            }
        }
        if !handled {
            tracing::debug!(method, "Unhandled notification");
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

fn log_failure(method: &str, error: &McpError) {
    let code = error.code().code();
    match error.source() {
        Some(cause) => {
            tracing::error!(method, code, error = %error, cause = %cause, "Handler failed");
        }
        None => tracing::warn!(method, code, error = %error, "Request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{ErrorCode, Notification, RequestId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use serde_json::json;

    struct Counting {
        method: &'static str,
        calls: Arc<AtomicUsize>,
        reply: Option<Map<String, Value>>,
    }

    impl MethodHandler for Counting {
        fn supports(&self, message: &Message) -> bool {
            message.method() == Some(self.method)
        }

        fn handle(&self, _: &Message, _: &mut RequestContext<'_>) -> HandlerResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn counting(method: &'static str, reply: Option<Value>) -> (Counting, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Counting {
            method,
            calls: Arc::clone(&calls),
            reply: reply.and_then(|v| v.as_object().cloned()),
        };
        (handler, calls)
    }

    fn run(dispatcher: &Dispatcher, input: &str) -> Option<Message> {
        let registry = Registry::new();
        let mut session = Session::new();
        let settings = ServerSettings::default();
        let mut context = RequestContext {
            registry: &registry,
            session: &mut session,
            settings: &settings,
        };
        dispatcher.process(input, &mut context)
    }

    #[test]
    fn first_supporting_handler_answers_request() {
        let mut dispatcher = Dispatcher::empty();
        let (first, first_calls) = counting("x", Some(json!({"from": "first"})));
        let (second, second_calls) = counting("x", Some(json!({"from": "second"})));
        dispatcher.add_handler(first);
        dispatcher.add_handler(second);

        let reply = run(&dispatcher, r#"{"jsonrpc":"2.0","id":1,"method":"x"}"#).unwrap();
        let Message::Response(response) = reply else {
            panic!("expected response");
        };
        assert_eq!(response.result["from"], "first");
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn null_result_stops_dispatch_without_reply() {
        let mut dispatcher = Dispatcher::empty();
        let (first, _) = counting("x", None);
        let (second, second_calls) = counting("x", Some(json!({})));
        dispatcher.add_handler(first);
        dispatcher.add_handler(second);

        assert!(run(&dispatcher, r#"{"jsonrpc":"2.0","id":1,"method":"x"}"#).is_none());
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notification_reaches_every_supporting_handler() {
        let mut dispatcher = Dispatcher::empty();
        let (first, first_calls) = counting("n", Some(json!({})));
        let (second, second_calls) = counting("n", None);
        let (other, other_calls) = counting("m", None);
        dispatcher.add_handler(first);
        dispatcher.add_handler(other);
        dispatcher.add_handler(second);

        assert!(run(&dispatcher, r#"{"jsonrpc":"2.0","method":"n"}"#).is_none());
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(other_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsupported_request_is_method_not_found() {
        let reply = run(&Dispatcher::empty(), r#"{"jsonrpc":"2.0","id":"a","method":"nope"}"#);
        let Some(Message::Error(error)) = reply else {
            panic!("expected error");
        };
        assert_eq!(error.id, RequestId::String("a".to_string()));
        assert_eq!(error.error.code, ErrorCode::MethodNotFound.code());
    }

    #[test]
    fn malformed_input_is_parse_error_with_id_zero() {
        let Some(Message::Error(error)) = run(&Dispatcher::new(), "{not json") else {
            panic!("expected error");
        };
        assert_eq!(error.id, RequestId::Number(0));
        assert_eq!(error.error.code, ErrorCode::ParseError.code());
    }

    #[test]
    fn empty_result_encodes_as_object() {
        let mut dispatcher = Dispatcher::empty();
        let (handler, _) = counting("x", Some(json!({})));
        dispatcher.add_handler(handler);
        let reply = run(&dispatcher, r#"{"jsonrpc":"2.0","id":3,"method":"x"}"#).unwrap();
        assert_eq!(reply.to_json().unwrap(), r#"{"jsonrpc":"2.0","id":3,"result":{}}"#);
    }

    #[test]
    fn batch_collects_replies_and_skips_notifications() {
        let mut dispatcher = Dispatcher::empty();
        let (handler, _) = counting("x", Some(json!({})));
        dispatcher.add_handler(handler);
        let reply = run(
            &dispatcher,
            r#"[{"jsonrpc":"2.0","id":1,"method":"x"},{"jsonrpc":"2.0","method":"x"},{"jsonrpc":"2.0","id":2,"method":"y"}]"#,
        )
        .unwrap();
        let Message::ResponseBatch(items) = reply else {
            panic!("expected batch");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Message::Response(_)));
        assert!(matches!(items[1], Message::Error(_)));
    }

    #[test]
    fn batch_of_notifications_has_no_reply() {
        let mut dispatcher = Dispatcher::empty();
        let (handler, calls) = counting("n", None);
        dispatcher.add_handler(handler);
        let message = Message::RequestBatch(vec![
            Notification::new("n", None).into(),
            Notification::new("n", None).into(),
        ]);
        let registry = Registry::new();
        let mut session = Session::new();
        let settings = ServerSettings::default();
        let mut context = RequestContext {
            registry: &registry,
            session: &mut session,
            settings: &settings,
        };
        assert!(dispatcher.dispatch(message, &mut context).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn incoming_responses_are_ignored() {
        assert!(run(&Dispatcher::new(), r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).is_none());
    }
}
