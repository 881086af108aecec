//! Normalisation of handler return values into protocol content.
//!
//! Handlers return an [`Output`]; the functions here turn it into the typed
//! items each method sends back. The order of the checks is part of the wire
//! contract:
//!
//! 1. typed content is used as-is
//! 2. a list of typed items is used as-is
//! 3. a mixed list has its untyped items coerced and flattened in; an empty
//!    list becomes a single `[]` text item
//! 4. a string becomes text (resources guess a MIME type from its shape)
//! 5. a byte stream is read fully and base64-encoded
//! 6. (resources) an object with a `text` or `blob` string is used directly
//! 7. `null`, booleans and numbers become their literal text
//! 8. any other structured value is pretty-printed JSON

use std::fmt;
use std::io::Read;

use serde_json::{Map, Value};

use crate::error::McpError;
use crate::model::{
    BlobResourceContents, Content, PromptMessage, ResourceContents, Role, TextResourceContents,
};

const NULL_MARKER: &str = "(null)";
const EMPTY_LIST_MARKER: &str = "[]";
const DEFAULT_BINARY_MIME: &str = "application/octet-stream";
const DEFAULT_TEXT_MIME: &str = "text/plain";
const JSON_MIME: &str = "application/json";

/// A value returned by a capability handler.
pub enum Output {
    /// A typed tool/prompt content item.
    Content(Content),
    /// Typed resource contents.
    Resource(ResourceContents),
    /// A typed prompt message.
    Message(PromptMessage),
    /// A list of outputs, possibly mixing typed and untyped items.
    List(Vec<Output>),
    /// A byte stream or file handle, read to the end and closed during coercion.
    Stream {
        /// The data source.
        reader: Box<dyn Read + Send>,
        /// MIME type of the data, if known.
        mime_type: Option<String>,
    },
    /// Any untyped JSON value.
    Value(Value),
}

impl Output {
    /// Wraps a reader whose contents become base64 blob content.
    pub fn stream(reader: impl Read + Send + 'static, mime_type: Option<&str>) -> Self {
        Self::Stream {
            reader: Box::new(reader),
            mime_type: mime_type.map(str::to_string),
        }
    }

    /// Whether this output is untyped JSON all the way down, nested lists
    /// included.
    fn is_plain(&self) -> bool {
        match self {
            Self::Value(_) => true,
            Self::List(items) => items.iter().all(Self::is_plain),
            _ => false,
        }
    }

    fn into_plain(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::List(items) => items
                .into_iter()
                .map(Self::into_plain)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Content(_) => "content",
            Self::Resource(_) => "resource contents",
            Self::Message(_) => "prompt message",
            Self::List(_) => "list",
            Self::Stream { .. } => "stream",
            Self::Value(value) => json_type_name(value),
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(content) => f.debug_tuple("Content").field(content).finish(),
            Self::Resource(resource) => f.debug_tuple("Resource").field(resource).finish(),
            Self::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Stream { mime_type, .. } => f
                .debug_struct("Stream")
                .field("mime_type", mime_type)
                .finish_non_exhaustive(),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

impl From<Content> for Output {
    fn from(value: Content) -> Self {
        Self::Content(value)
    }
}

impl From<ResourceContents> for Output {
    fn from(value: ResourceContents) -> Self {
        Self::Resource(value)
    }
}

impl From<PromptMessage> for Output {
    fn from(value: PromptMessage) -> Self {
        Self::Message(value)
    }
}

impl From<Vec<Self>> for Output {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<&str> for Output {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<bool> for Output {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<i64> for Output {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for Output {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<()> for Output {
    fn from((): ()) -> Self {
        Self::Value(Value::Null)
    }
}

/// Coerces a tool handler's output into content items.
///
/// # Errors
///
/// Returns a formatting error for prompt messages, for streams that are
/// neither image nor audio, and when a stream cannot be read.
pub fn to_contents(output: Output) -> Result<Vec<Content>, McpError> {
    match output {
        Output::Content(content) => Ok(vec![content]),
        Output::Resource(resource) => Ok(vec![Content::embedded(resource)]),
        Output::List(items) => coerce_list(items, to_contents, |values| {
            Ok(vec![Content::text(pretty_json(&values)?)])
        }),
        Output::Stream { reader, mime_type } => {
            let bytes = read_stream(reader)?;
            let mime_type = mime_type.unwrap_or_else(|| DEFAULT_BINARY_MIME.to_string());
            if mime_type.starts_with("image/") {
                Ok(vec![Content::image(&bytes, mime_type)])
            } else if mime_type.starts_with("audio/") {
                Ok(vec![Content::audio(&bytes, mime_type)])
            } else {
                Err(McpError::Formatting(format!(
                    "cannot return a {mime_type} stream from a tool; expected image/* or audio/*"
                )))
            }
        }
        Output::Value(Value::String(text)) => Ok(vec![Content::text(text)]),
        Output::Value(value) => Ok(vec![Content::text(scalar_or_json(&value)?)]),
        other @ Output::Message(_) => Err(unresolved(&other)),
    }
}

/// Coerces a resource handler's output into resource contents for `uri`.
///
/// `declared_mime` is the MIME type from the resource or template definition.
///
/// # Errors
///
/// Returns a formatting error for prompt messages and when a stream cannot
/// be read.
pub fn to_resource_contents(
    output: Output,
    uri: &str,
    declared_mime: Option<&str>,
) -> Result<Vec<ResourceContents>, McpError> {
    match output {
        Output::Resource(resource) => Ok(vec![resource]),
        Output::Content(content) => Ok(vec![content_to_resource(content, uri, declared_mime)]),
        Output::List(items) => coerce_list(
            items,
            |item| to_resource_contents(item, uri, declared_mime),
            |values| Ok(vec![json_contents(uri, declared_mime, &values)?]),
        ),
        Output::Value(Value::String(text)) => {
            let mime_type = declared_mime.map_or_else(|| guess_mime_type(&text), str::to_string);
            Ok(vec![ResourceContents::text(uri, text, Some(mime_type))])
        }
        Output::Stream { reader, mime_type } => {
            let bytes = read_stream(reader)?;
            let mime_type = mime_type
                .or_else(|| declared_mime.map(str::to_string))
                .unwrap_or_else(|| DEFAULT_BINARY_MIME.to_string());
            Ok(vec![ResourceContents::blob(uri, &bytes, Some(mime_type))])
        }
        Output::Value(Value::Object(object)) => {
            if let Some(contents) = direct_contents(&object, uri, declared_mime) {
                return Ok(vec![contents]);
            }
            Ok(vec![json_contents(uri, declared_mime, &Value::Object(object))?])
        }
        Output::Value(value @ Value::Array(_)) => {
            Ok(vec![json_contents(uri, declared_mime, &value)?])
        }
        Output::Value(value) => {
            let mime_type = declared_mime.unwrap_or(DEFAULT_TEXT_MIME).to_string();
            Ok(vec![ResourceContents::text(
                uri,
                scalar_or_json(&value)?,
                Some(mime_type),
            )])
        }
        other @ Output::Message(_) => Err(unresolved(&other)),
    }
}

/// Coerces a prompt handler's output into prompt messages.
///
/// Accepted shapes: typed messages, content (sent as the user), strings (sent
/// as the user), `{"role": ..., "content": ...}` objects, `{"user": ...,
/// "assistant": ...}` objects, and lists of any of these.
///
/// # Errors
///
/// Returns a formatting error for any other shape.
pub fn to_prompt_messages(output: Output) -> Result<Vec<PromptMessage>, McpError> {
    match output {
        Output::Message(message) => Ok(vec![message]),
        Output::Content(content) => Ok(vec![PromptMessage::user(content)]),
        Output::List(items) => items.into_iter().try_fold(Vec::new(), |mut acc, item| {
            acc.extend(to_prompt_messages(item)?);
            Ok(acc)
        }),
        Output::Value(value) => value_to_messages(value),
        other => Err(unresolved(&other)),
    }
}

/// Guesses a MIME type from the leading and trailing characters of `text`.
#[must_use]
pub fn guess_mime_type(text: &str) -> String {
    let trimmed = text.trim();
    let mime = if trimmed.starts_with('<') && trimmed.ends_with('>') {
        let lower = trimmed.to_ascii_lowercase();
        if lower.contains("<html") {
            "text/html"
        } else if lower.contains("<?xml") {
            "application/xml"
        } else {
            DEFAULT_TEXT_MIME
        }
    } else if (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
    {
        JSON_MIME
    } else {
        DEFAULT_TEXT_MIME
    };
    mime.to_string()
}

/// Applies the list rules shared by tools and resources.
///
/// `coerce` handles a single item; `encode` handles a list whose items are
/// all plain JSON, nested plain lists included.
fn coerce_list<T>(
    items: Vec<Output>,
    coerce: impl Fn(Output) -> Result<Vec<T>, McpError>,
    encode: impl FnOnce(Value) -> Result<Vec<T>, McpError>,
) -> Result<Vec<T>, McpError> {
    if items.is_empty() {
        return coerce(Output::from(EMPTY_LIST_MARKER));
    }

    if items.iter().all(Output::is_plain) {
        let values = items.into_iter().filter_map(Output::into_plain).collect();
        return encode(Value::Array(values));
    }

    items.into_iter().try_fold(Vec::new(), |mut acc, item| {
        acc.extend(coerce(item)?);
        Ok(acc)
    })
}

fn content_to_resource(content: Content, uri: &str, declared_mime: Option<&str>) -> ResourceContents {
    match content {
        Content::Resource { resource, .. } => resource,
        Content::Text { text, .. } => {
            let mime_type = declared_mime.map_or_else(|| guess_mime_type(&text), str::to_string);
            ResourceContents::text(uri, text, Some(mime_type))
        }
        Content::Image {
            data, mime_type, ..
        }
        | Content::Audio {
            data, mime_type, ..
        } => ResourceContents::Blob(BlobResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type),
            blob: data,
        }),
    }
}

/// Rule 6: an object carrying a `text` or `blob` string is used directly.
fn direct_contents(
    object: &Map<String, Value>,
    uri: &str,
    declared_mime: Option<&str>,
) -> Option<ResourceContents> {
    let mime_type = object
        .get("mimeType")
        .and_then(Value::as_str)
        .or(declared_mime);

    if let Some(text) = object.get("text").and_then(Value::as_str) {
        return Some(ResourceContents::Text(TextResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type.unwrap_or(DEFAULT_TEXT_MIME).to_string()),
            text: text.to_string(),
        }));
    }

    object.get("blob").and_then(Value::as_str).map(|blob| {
        ResourceContents::Blob(BlobResourceContents {
            uri: uri.to_string(),
            mime_type: Some(mime_type.unwrap_or(DEFAULT_BINARY_MIME).to_string()),
            blob: blob.to_string(),
        })
    })
}

fn json_contents(
    uri: &str,
    declared_mime: Option<&str>,
    value: &Value,
) -> Result<ResourceContents, McpError> {
    let mime_type = match declared_mime {
        Some(mime) if mime.contains("json") => mime,
        _ => JSON_MIME,
    };
    Ok(ResourceContents::text(
        uri,
        pretty_json(value)?,
        Some(mime_type.to_string()),
    ))
}

/// Rules 7 and 8 for non-string values.
fn scalar_or_json(value: &Value) -> Result<String, McpError> {
    match value {
        Value::Null => Ok(NULL_MARKER.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Number(number) => Ok(number.to_string()),
        Value::String(text) => Ok(text.clone()),
        Value::Array(_) | Value::Object(_) => pretty_json(value),
    }
}

fn pretty_json(value: &Value) -> Result<String, McpError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| McpError::Formatting(format!("failed to encode JSON result: {e}")))
}

fn read_stream(mut reader: Box<dyn Read + Send>) -> Result<Vec<u8>, McpError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| McpError::Internal(format!("failed to read handler stream: {e}")))?;
    Ok(bytes)
}

fn value_to_messages(value: Value) -> Result<Vec<PromptMessage>, McpError> {
    match value {
        Value::String(text) => Ok(vec![PromptMessage::user(Content::text(text))]),
        Value::Array(items) => items.into_iter().try_fold(Vec::new(), |mut acc, item| {
            acc.extend(value_to_messages(item)?);
            Ok(acc)
        }),
        Value::Object(object) if object.contains_key("role") => {
            let role: Role = object
                .get("role")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| McpError::Formatting(format!("invalid prompt message role: {e}")))?
                .unwrap_or(Role::User);
            let content = object
                .get("content")
                .cloned()
                .ok_or_else(|| McpError::Formatting("prompt message has no content".to_string()))
                .and_then(value_to_content)?;
            Ok(vec![PromptMessage { role, content }])
        }
        Value::Object(object)
            if object.contains_key("user") || object.contains_key("assistant") =>
        {
            let mut messages = Vec::new();
            if let Some(user) = object.get("user") {
                messages.push(PromptMessage::user(value_to_content(user.clone())?));
            }
            if let Some(assistant) = object.get("assistant") {
                messages.push(PromptMessage::assistant(value_to_content(assistant.clone())?));
            }
            Ok(messages)
        }
        other => Err(McpError::Formatting(format!(
            "cannot build prompt messages from {}",
            json_type_name(&other)
        ))),
    }
}

fn value_to_content(value: Value) -> Result<Content, McpError> {
    match value {
        Value::String(text) => Ok(Content::text(text)),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| McpError::Formatting(format!("invalid prompt message content: {e}"))),
        other => Ok(Content::text(scalar_or_json(&other)?)),
    }
}

fn unresolved(output: &Output) -> McpError {
    McpError::Formatting(format!(
        "unable to format handler result of type {}",
        output.type_name()
    ))
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn texts(contents: &[Content]) -> Vec<&str> {
        contents.iter().filter_map(Content::as_text).collect()
    }

    #[test]
    fn typed_content_is_returned_unchanged() {
        let items = vec![Content::text("a"), Content::image(b"png", "image/png")];
        let output = Output::List(items.iter().cloned().map(Output::from).collect());
        assert_eq!(to_contents(output).unwrap(), items);
    }

    #[test]
    fn null_becomes_marker() {
        let contents = to_contents(Output::Value(Value::Null)).unwrap();
        assert_eq!(texts(&contents), vec!["(null)"]);
        assert_eq!(to_contents(().into()).unwrap(), contents);
    }

    #[test]
    fn scalars_become_literal_text() {
        assert_eq!(texts(&to_contents(true.into()).unwrap()), vec!["true"]);
        assert_eq!(texts(&to_contents(false.into()).unwrap()), vec!["false"]);
        assert_eq!(texts(&to_contents(5_i64.into()).unwrap()), vec!["5"]);
        assert_eq!(texts(&to_contents(2.5_f64.into()).unwrap()), vec!["2.5"]);
    }

    #[test]
    fn plain_string_list_is_one_json_item() {
        let contents = to_contents(json!(["a", "b"]).into()).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(texts(&contents), vec!["[\n  \"a\",\n  \"b\"\n]"]);

        let contents = to_contents(Output::List(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn nested_plain_lists_are_one_json_item() {
        let output = Output::List(vec!["a".into(), Output::List(vec!["b".into()])]);
        let contents = to_contents(output).unwrap();
        assert_eq!(contents.len(), 1);
        let encoded: Value = serde_json::from_str(texts(&contents)[0]).unwrap();
        assert_eq!(encoded, json!(["a", ["b"]]));

        let output = Output::List(vec![Output::List(vec![1_i64.into()]), json!({"k": 2}).into()]);
        let contents = to_resource_contents(output, "data://x", None).unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].mime_type(), Some("application/json"));
    }

    #[test]
    fn mixed_list_is_flattened() {
        let output = Output::List(vec![
            Content::text("typed").into(),
            "plain".into(),
            Output::List(vec![Content::text("nested").into(), 1_i64.into()]),
        ]);
        let contents = to_contents(output).unwrap();
        assert_eq!(texts(&contents), vec!["typed", "plain", "nested", "1"]);
    }

    #[test]
    fn empty_list_is_marker() {
        let contents = to_contents(Output::List(Vec::new())).unwrap();
        assert_eq!(texts(&contents), vec!["[]"]);
    }

    #[test]
    fn structured_values_are_pretty_json_without_escaping() {
        let contents = to_contents(json!({"url": "https://example.com/ü"}).into()).unwrap();
        assert_eq!(
            texts(&contents),
            vec!["{\n  \"url\": \"https://example.com/ü\"\n}"]
        );
    }

    #[test]
    fn image_stream_becomes_image_content() {
        let output = Output::stream(Cursor::new(b"GIF89a".to_vec()), Some("image/gif"));
        let contents = to_contents(output).unwrap();
        assert!(matches!(&contents[0], Content::Image { mime_type, .. } if mime_type == "image/gif"));
    }

    #[test]
    fn untyped_binary_stream_cannot_be_a_tool_result() {
        let output = Output::stream(Cursor::new(vec![0_u8, 1, 2]), None);
        assert!(matches!(to_contents(output), Err(McpError::Formatting(_))));
    }

    /// Reader that records when it is dropped, optionally failing every read.
    struct TrackedReader {
        inner: Cursor<Vec<u8>>,
        fail: bool,
        dropped: Arc<AtomicBool>,
    }

    impl TrackedReader {
        fn new(data: &[u8], fail: bool) -> (Self, Arc<AtomicBool>) {
            let dropped = Arc::new(AtomicBool::new(false));
            let reader = Self {
                inner: Cursor::new(data.to_vec()),
                fail,
                dropped: Arc::clone(&dropped),
            };
            (reader, dropped)
        }
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.fail {
                return Err(std::io::Error::other("device unplugged"));
            }
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn streams_are_closed_once_read() {
        let (reader, dropped) = TrackedReader::new(b"PNG", false);
        let contents = to_contents(Output::stream(reader, Some("image/png"))).unwrap();
        assert!(dropped.load(Ordering::SeqCst));
        assert!(matches!(&contents[0], Content::Image { data, .. } if data == "UE5H"));

        let (reader, dropped) = TrackedReader::new(b"hi", false);
        let contents = to_resource_contents(Output::stream(reader, None), "file:///hi", None).unwrap();
        assert!(dropped.load(Ordering::SeqCst));
        assert!(matches!(&contents[0], ResourceContents::Blob(b) if b.blob == "aGk="));
    }

    #[test]
    fn streams_are_closed_when_reading_fails() {
        let (reader, dropped) = TrackedReader::new(b"", true);
        let err = to_contents(Output::stream(reader, Some("audio/wav"))).unwrap_err();
        assert!(dropped.load(Ordering::SeqCst));
        assert!(err.to_string().contains("device unplugged"));

        let (reader, dropped) = TrackedReader::new(b"", true);
        assert!(to_resource_contents(Output::stream(reader, None), "file:///x", None).is_err());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[test]
    fn prompt_message_is_not_tool_content() {
        let output = PromptMessage::user(Content::text("hi")).into();
        let err = to_contents(output).unwrap_err();
        assert!(err.to_string().contains("prompt message"));
    }

    #[test]
    fn resource_string_guesses_mime() {
        let uri = "data://x";
        let cases = [
            ("<html><body/></html>", "text/html"),
            ("<?xml version=\"1.0\"?><a/>", "application/xml"),
            ("<b>bold</b>", "text/plain"),
            ("{\"a\": 1}", "application/json"),
            (" [1, 2] ", "application/json"),
            ("hello", "text/plain"),
        ];
        for (text, expected) in cases {
            let contents = to_resource_contents(text.into(), uri, None).unwrap();
            assert_eq!(contents[0].mime_type(), Some(expected), "for {text}");
        }
    }

    #[test]
    fn resource_string_honours_declared_mime() {
        let contents =
            to_resource_contents("{\"a\": 1}".into(), "data://x", Some("text/markdown")).unwrap();
        assert_eq!(contents[0].mime_type(), Some("text/markdown"));
    }

    #[test]
    fn resource_stream_becomes_blob() {
        let output = Output::stream(Cursor::new(b"hi".to_vec()), None);
        let contents = to_resource_contents(output, "file:///hi.bin", Some("application/x-hi"))
            .unwrap();
        assert_eq!(
            contents,
            vec![ResourceContents::Blob(BlobResourceContents {
                uri: "file:///hi.bin".to_string(),
                mime_type: Some("application/x-hi".to_string()),
                blob: "aGk=".to_string(),
            })]
        );
    }

    #[test]
    fn resource_object_with_text_or_blob_is_direct() {
        let contents = to_resource_contents(
            json!({"text": "# Title", "mimeType": "text/markdown"}).into(),
            "doc://readme",
            None,
        )
        .unwrap();
        assert_eq!(
            contents,
            vec![ResourceContents::text(
                "doc://readme",
                "# Title",
                Some("text/markdown".to_string())
            )]
        );

        let contents =
            to_resource_contents(json!({"blob": "AAE="}).into(), "doc://bin", None).unwrap();
        assert!(matches!(&contents[0], ResourceContents::Blob(b) if b.blob == "AAE="));
    }

    #[test]
    fn resource_structured_value_falls_back_to_json_mime() {
        let contents =
            to_resource_contents(json!({"a": 1}).into(), "data://x", Some("text/plain")).unwrap();
        assert_eq!(contents[0].mime_type(), Some("application/json"));

        let contents = to_resource_contents(
            json!([1]).into(),
            "data://x",
            Some("application/vnd.api+json"),
        )
        .unwrap();
        assert_eq!(contents[0].mime_type(), Some("application/vnd.api+json"));
    }

    #[test]
    fn resource_null_is_marker() {
        let contents = to_resource_contents(Output::Value(Value::Null), "data://x", None).unwrap();
        assert!(matches!(&contents[0], ResourceContents::Text(t) if t.text == "(null)"));
    }

    #[test]
    fn text_content_becomes_resource_text() {
        let contents =
            to_resource_contents(Content::text("hello").into(), "data://x", None).unwrap();
        assert_eq!(
            contents,
            vec![ResourceContents::text(
                "data://x",
                "hello",
                Some("text/plain".to_string())
            )]
        );
    }

    #[test]
    fn prompt_shapes() {
        let messages = to_prompt_messages("Summarise this".into()).unwrap();
        assert_eq!(messages, vec![PromptMessage::user(Content::text("Summarise this"))]);

        let messages = to_prompt_messages(
            json!([
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": {"type": "text", "text": "Hello"}}
            ])
            .into(),
        )
        .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, Role::Assistant);

        let messages =
            to_prompt_messages(json!({"user": "question", "assistant": "answer"}).into()).unwrap();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].content.as_text(), Some("answer"));
    }

    #[test]
    fn prompt_rejects_unstructured_values() {
        assert!(matches!(
            to_prompt_messages(42_i64.into()),
            Err(McpError::Formatting(_))
        ));
    }
}
