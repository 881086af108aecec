//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the message envelope used by the Model Context Protocol
//! and the parser that classifies raw JSON into envelopes.
//!
//! # Message Types
//!
//! - **Request**: A message expecting a response (has `method` and `id`)
//! - **Notification**: A one-way message (has `method`, no `id`)
//! - **Response**: A successful reply (has `id` and `result`)
//! - **Error**: A failed reply (has `id` and `error`)
//! - **Batches**: A JSON array of requests/notifications or of responses/errors
//!
//! # MCP-Specific Constraints
//!
//! - Request IDs must be strings or integers (never `null`)
//! - Results are always JSON objects; an empty result encodes as `{}`

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::McpError;

/// The JSON-RPC version string every message must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// The newest MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// All protocol versions accepted during initialisation, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "capability-mcp";

/// The `"jsonrpc": "2.0"` marker.
///
/// Serialises as the literal version string and refuses anything else on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(Self)
        } else {
            Err(de::Error::custom(format!(
                "jsonrpc field must be \"{JSONRPC_VERSION}\", got \"{version}\""
            )))
        }
    }
}

/// A JSON-RPC 2.0 request ID.
///
/// Per the MCP specification, IDs must be strings or integers, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(i64),
    /// String request ID.
    String(String),
}

impl RequestId {
    /// The ID used for errors whose request ID cannot be determined.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::Number(0)
    }

    /// Extracts the ID from a raw message object, if it holds a valid one.
    fn determine(object: &Map<String, Value>) -> Option<Self> {
        object
            .get("id")
            .and_then(|id| Self::deserialize(id).ok())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A JSON-RPC 2.0 request message.
///
/// Requests expect a response from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Always "2.0".
    pub jsonrpc: Version,

    /// Unique request identifier.
    pub id: RequestId,

    /// The method to invoke.
    pub method: String,

    /// Optional parameters for the method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a new request.
    #[must_use]
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Version,
            id,
            method: method.into(),
            params,
        }
    }

    /// Builds a request from a raw JSON object, validating required fields.
    ///
    /// # Errors
    ///
    /// Returns an Invalid Request error response if the object is not a
    /// well-formed request.
    pub fn from_value(value: Value) -> Result<Self, ErrorResponse> {
        let id = value.as_object().and_then(RequestId::determine);
        let request: Self = decode(value, id.clone(), "request")?;
        validate_method(&request.method, Some(request.id.clone()))?;
        validate_params(request.params.as_ref(), Some(request.id.clone()))?;
        Ok(request)
    }
}

/// A JSON-RPC 2.0 notification message.
///
/// Notifications do not have an ID and do not expect a response. The same
/// type is used for incoming notifications and for server-initiated ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Always "2.0".
    pub jsonrpc: Version,

    /// The notification method.
    pub method: String,

    /// Optional parameters for the notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Creates a new notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Version,
            method: method.into(),
            params,
        }
    }

    /// Builds a notification from a raw JSON object.
    ///
    /// # Errors
    ///
    /// Returns an Invalid Request error response if the object is not a
    /// well-formed notification.
    pub fn from_value(value: Value) -> Result<Self, ErrorResponse> {
        let notification: Self = decode(value, None, "notification")?;
        validate_method(&notification.method, None)?;
        validate_params(notification.params.as_ref(), None)?;
        Ok(notification)
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always "2.0".
    pub jsonrpc: Version,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call. Always a JSON object.
    pub result: Map<String, Value>,
}

impl Response {
    /// Creates a new success response.
    #[must_use]
    pub const fn success(id: RequestId, result: Map<String, Value>) -> Self {
        Self {
            jsonrpc: Version,
            id,
            result,
        }
    }

    /// Builds a response from a raw JSON object.
    ///
    /// # Errors
    ///
    /// Returns an Invalid Request error response if the object is not a
    /// well-formed response.
    pub fn from_value(value: Value) -> Result<Self, ErrorResponse> {
        let id = value.as_object().and_then(RequestId::determine);
        decode(value, id, "response")
    }
}

/// Standard JSON-RPC 2.0 error codes, plus the MCP resource-not-found code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// The JSON sent is not a valid Request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// The requested resource does not exist.
    ResourceNotFound,
    /// Server-defined error.
    ServerError(i32),
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ResourceNotFound => -32002,
            Self::ServerError(code) => code,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
            Self::ResourceNotFound => "Resource not found",
            Self::ServerError(_) => "Server error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "2.0".
    pub jsonrpc: Version,

    /// The request ID this error corresponds to; `0` when it cannot be determined.
    pub id: RequestId,

    /// The error details.
    pub error: ErrorObject,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub const fn new(id: RequestId, error: ErrorObject) -> Self {
        Self {
            jsonrpc: Version,
            id,
            error,
        }
    }

    /// Builds an error response from a raw JSON object.
    ///
    /// # Errors
    ///
    /// Returns an Invalid Request error response if the object is not a
    /// well-formed error response.
    pub fn from_value(value: Value) -> Result<Self, ErrorResponse> {
        let id = value.as_object().and_then(RequestId::determine);
        decode(value, id, "error response")
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::from_error(
            RequestId::unknown(),
            &McpError::Parse(format!("Parse error: {detail}")),
        )
    }

    /// Creates an invalid request error response.
    #[must_use]
    pub fn invalid_request(id: Option<RequestId>, message: impl Into<String>) -> Self {
        Self::new(
            id.unwrap_or_else(RequestId::unknown),
            ErrorObject::with_message(ErrorCode::InvalidRequest, message),
        )
    }

    /// Creates a method not found error response.
    #[must_use]
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::new(
            id,
            ErrorObject::with_message(
                ErrorCode::MethodNotFound,
                format!("Method not found: {method}"),
            ),
        )
    }

    /// Creates an invalid params error response.
    #[must_use]
    pub fn invalid_params(id: RequestId, message: impl Into<String>) -> Self {
        Self::new(id, ErrorObject::with_message(ErrorCode::InvalidParams, message))
    }

    /// Converts a protocol error raised while handling request `id`.
    #[must_use]
    pub fn from_error(id: RequestId, error: &McpError) -> Self {
        Self::new(
            id,
            ErrorObject::with_message(error.code(), error.client_message()),
        )
    }
}

/// Any JSON-RPC message or batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A request expecting a response.
    Request(Request),
    /// A notification (no response expected).
    Notification(Notification),
    /// A successful reply.
    Response(Response),
    /// A failed reply.
    Error(ErrorResponse),
    /// A batch of requests and notifications.
    RequestBatch(Vec<Message>),
    /// A batch of responses and errors.
    ResponseBatch(Vec<Message>),
}

impl Message {
    /// Returns the method name of a request or notification.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(req) => Some(&req.method),
            Self::Notification(notif) => Some(&notif.method),
            _ => None,
        }
    }

    /// Returns the parameters of a request or notification.
    #[must_use]
    pub fn params(&self) -> Option<&Value> {
        match self {
            Self::Request(req) => req.params.as_ref(),
            Self::Notification(notif) => notif.params.as_ref(),
            _ => None,
        }
    }

    /// Returns the ID of a request, response or error.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Response(resp) => Some(&resp.id),
            Self::Error(err) => Some(&err.id),
            _ => None,
        }
    }

    /// Whether this is a request for `method`.
    #[must_use]
    pub fn is_request_for(&self, method: &str) -> bool {
        matches!(self, Self::Request(req) if req.method == method)
    }

    /// Whether this is a notification for `method`.
    #[must_use]
    pub fn is_notification_for(&self, method: &str) -> bool {
        matches!(self, Self::Notification(notif) if notif.method == method)
    }

    /// Serialises the message as a single line of JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<Request> for Message {
    fn from(value: Request) -> Self {
        Self::Request(value)
    }
}

impl From<Notification> for Message {
    fn from(value: Notification) -> Self {
        Self::Notification(value)
    }
}

impl From<Response> for Message {
    fn from(value: Response) -> Self {
        Self::Response(value)
    }
}

impl From<ErrorResponse> for Message {
    fn from(value: ErrorResponse) -> Self {
        Self::Error(value)
    }
}

/// Parses a JSON string into a message.
///
/// # Errors
///
/// Returns a Parse Error response for malformed JSON and an Invalid Request
/// response for JSON that is not a recognisable message.
pub fn parse_message(json: &str) -> Result<Message, ErrorResponse> {
    let value: Value = serde_json::from_str(json).map_err(ErrorResponse::parse_error)?;
    parse_value(value)
}

/// Classifies an already-decoded JSON value into a message.
///
/// # Errors
///
/// Returns an Invalid Request response if the value is not a recognisable
/// message or batch.
pub fn parse_value(value: Value) -> Result<Message, ErrorResponse> {
    match value {
        Value::Array(items) => parse_batch(items),
        Value::Object(_) => parse_single(value),
        _ => Err(ErrorResponse::invalid_request(
            None,
            "Unrecognized message: expected a JSON object or array",
        )),
    }
}

/// Classifies a batch by its first element.
fn parse_batch(items: Vec<Value>) -> Result<Message, ErrorResponse> {
    let Some(first) = items.first().and_then(Value::as_object) else {
        return Err(ErrorResponse::invalid_request(
            None,
            "Unrecognized message: empty or malformed batch",
        ));
    };

    if first.contains_key("method") {
        let messages = items
            .into_iter()
            .map(|item| match parse_single(item)? {
                msg @ (Message::Request(_) | Message::Notification(_)) => Ok(msg),
                other => Err(ErrorResponse::invalid_request(
                    other.id().cloned(),
                    "Request batch may only contain requests and notifications",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Message::RequestBatch(messages));
    }

    if first.contains_key("id") && (first.contains_key("result") || first.contains_key("error")) {
        let messages = items
            .into_iter()
            .map(|item| match parse_single(item)? {
                msg @ (Message::Response(_) | Message::Error(_)) => Ok(msg),
                other => Err(ErrorResponse::invalid_request(
                    other.id().cloned(),
                    "Response batch may only contain responses and errors",
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Message::ResponseBatch(messages));
    }

    Err(ErrorResponse::invalid_request(
        None,
        "Unrecognized message: batch elements are neither requests nor responses",
    ))
}

/// Classifies a single JSON object.
fn parse_single(value: Value) -> Result<Message, ErrorResponse> {
    let Some(object) = value.as_object() else {
        return Err(ErrorResponse::invalid_request(
            None,
            "Unrecognized message: expected a JSON object",
        ));
    };
    let id = RequestId::determine(object);

    match object.get("jsonrpc").and_then(Value::as_str) {
        Some(JSONRPC_VERSION) => {}
        Some(other) => {
            return Err(ErrorResponse::invalid_request(
                id,
                format!("Invalid jsonrpc version \"{other}\": must be \"{JSONRPC_VERSION}\""),
            ));
        }
        None => {
            return Err(ErrorResponse::invalid_request(
                id,
                "Missing jsonrpc field: must be \"2.0\"",
            ));
        }
    }

    let has_method = object.contains_key("method");
    let has_id = object.contains_key("id");

    if has_method && has_id {
        Request::from_value(value).map(Message::Request)
    } else if has_method {
        Notification::from_value(value).map(Message::Notification)
    } else if has_id && object.contains_key("result") {
        Response::from_value(value).map(Message::Response)
    } else if has_id && object.contains_key("error") {
        ErrorResponse::from_value(value).map(Message::Error)
    } else {
        Err(ErrorResponse::invalid_request(
            id,
            "Unrecognized message: expected method, result or error",
        ))
    }
}

/// Deserialises an envelope, mapping failures to Invalid Request.
fn decode<T: serde::de::DeserializeOwned>(
    value: Value,
    id: Option<RequestId>,
    kind: &str,
) -> Result<T, ErrorResponse> {
    serde_json::from_value(value)
        .map_err(|e| ErrorResponse::invalid_request(id, format!("Invalid {kind}: {e}")))
}

fn validate_method(method: &str, id: Option<RequestId>) -> Result<(), ErrorResponse> {
    if method.is_empty() {
        return Err(ErrorResponse::invalid_request(
            id,
            "method field cannot be empty",
        ));
    }
    Ok(())
}

fn validate_params(params: Option<&Value>, id: Option<RequestId>) -> Result<(), ErrorResponse> {
    match params {
        None | Some(Value::Object(_) | Value::Array(_)) => Ok(()),
        Some(_) => Err(ErrorResponse::invalid_request(
            id,
            "params must be an object or an array",
        )),
    }
}
