//! Integration tests for MCP protocol handling.
//!
//! These tests drive the server through `McpServer::handle_line`, covering
//! request/response handling, error responses, batches, pagination and the
//! lifecycle.

use capability_mcp::error::HandlerError;
use capability_mcp::mcp::protocol::{parse_message, Message, RequestId};
use capability_mcp::mcp::server::{McpServer, ServerSettings};
use capability_mcp::model::{Content, Prompt, PromptArgument, Resource, ResourceTemplate, Tool};
use capability_mcp::registry::{handler_fn, Output};
use serde_json::{json, Value};

fn server_with_page_size(page_size: usize) -> McpServer {
    McpServer::new(ServerSettings {
        page_size,
        ..ServerSettings::default()
    })
}

fn add_tool() -> Tool {
    Tool::new(
        "add",
        json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }),
    )
    .unwrap()
    .with_description("Adds two numbers")
}

fn register_add(server: &mut McpServer) {
    server.registry_mut().register_tool(
        add_tool(),
        handler_fn(|args| match (args["a"].as_i64(), args["b"].as_i64()) {
            (Some(a), Some(b)) => Ok(Output::from(a + b)),
            _ => {
                let a = args["a"].as_f64().unwrap_or_default();
                let b = args["b"].as_f64().unwrap_or_default();
                Ok(Output::from(a + b))
            }
        }),
        true,
    );
}

fn call(server: &mut McpServer, line: &str) -> Value {
    let reply = server.handle_line(line).expect("expected a reply");
    serde_json::from_str(&reply).unwrap()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let Message::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    if let Message::Notification(notif) = parse_message(json).unwrap() {
        assert_eq!(notif.method, "notifications/initialized");
    } else {
        panic!("Expected Notification");
    }
}

#[test]
fn test_parse_invalid_json() {
    let error = parse_message("not valid json").unwrap_err();
    assert_eq!(error.error.code, -32700);
    assert_eq!(error.id, RequestId::Number(0));
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 7,
        "method": "test"
    }"#;

    let error = parse_message(json).unwrap_err();
    assert_eq!(error.error.code, -32600);
    assert_eq!(error.id, RequestId::Number(7));
}

// =============================================================================
// Tool Scenarios
// =============================================================================

#[test]
fn test_tool_call_returns_text_content() {
    let mut server = McpServer::default();
    register_add(&mut server);

    let reply = server
        .handle_line(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"add","arguments":{"a":2,"b":3}}}"#,
        )
        .unwrap();

    assert_eq!(
        reply,
        r#"{"jsonrpc":"2.0","id":1,"result":{"content":[{"type":"text","text":"5"}],"isError":false}}"#
    );
}

#[test]
fn test_tool_call_converts_string_arguments() {
    let mut server = McpServer::default();
    register_add(&mut server);

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":"2","b":3.5}}}"#,
    );
    assert_eq!(value["result"]["content"][0]["text"], "5.5");

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"add","arguments":{"a":"2","b":"3"}}}"#,
    );
    assert_eq!(value["result"]["content"][0]["text"], "5");
}

#[test]
fn test_null_arguments_mean_no_arguments() {
    let mut server = McpServer::default();
    server.registry_mut().register_tool(
        Tool::new("status", json!({"type": "object"})).unwrap(),
        handler_fn(|args| Ok(Output::from(args.len() as i64))),
        true,
    );
    server.registry_mut().register_prompt(
        Prompt::new("greet").unwrap(),
        handler_fn(|_| Ok("Hello".into())),
        true,
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"status","arguments":null}}"#,
    );
    assert_eq!(value["result"]["content"][0]["text"], "0");

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"prompts/get","params":{"name":"greet","arguments":null}}"#,
    );
    assert_eq!(value["result"]["messages"][0]["content"]["text"], "Hello");
}

#[test]
fn test_unknown_tool_is_method_not_found() {
    let mut server = McpServer::default();

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"missing"}}"#,
    );
    assert_eq!(value["error"]["code"], -32601);
    assert_eq!(value["id"], 3);
    assert!(value.get("result").is_none());
}

#[test]
fn test_missing_argument_is_invalid_params() {
    let mut server = McpServer::default();
    register_add(&mut server);

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"add","arguments":{"a":1}}}"#,
    );
    assert_eq!(value["error"]["code"], -32602);
}

#[test]
fn test_handler_failure_hides_cause() {
    let mut server = McpServer::default();
    server.registry_mut().register_tool(
        Tool::new("explode", json!({"type": "object"})).unwrap(),
        handler_fn(|_| Err(HandlerError::failed("database password is hunter2"))),
        true,
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"explode"}}"#,
    );
    assert_eq!(value["error"]["code"], -32603);
    let message = value["error"]["message"].as_str().unwrap();
    assert!(message.contains("explode"));
    assert!(!message.contains("hunter2"));
}

#[test]
fn test_tool_returning_image_content() {
    let mut server = McpServer::default();
    server.registry_mut().register_tool(
        Tool::new("logo", json!({"type": "object"})).unwrap(),
        handler_fn(|_| Ok(Content::image(b"\x89PNG", "image/png").into())),
        true,
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"logo"}}"#,
    );
    let content = &value["result"]["content"][0];
    assert_eq!(content["type"], "image");
    assert_eq!(content["mimeType"], "image/png");
    assert_eq!(content["data"], "iVBORw==");
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_initialize_negotiates_latest_for_unknown_version() {
    let mut server = McpServer::default();

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2000-01-01","capabilities":{}}}"#,
    );
    let result = &value["result"];
    assert_eq!(result["protocolVersion"], "2025-03-26");
    assert_eq!(result["serverInfo"]["name"], "capability-mcp");
    assert_eq!(result["capabilities"]["resources"]["subscribe"], true);
    assert!(result.get("instructions").is_none());
}

#[test]
fn test_ping_returns_empty_object() {
    let mut server = McpServer::default();
    assert_eq!(
        server
            .handle_line(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#)
            .unwrap(),
        r#"{"jsonrpc":"2.0","id":"p","result":{}}"#
    );
}

#[test]
fn test_notifications_produce_no_reply() {
    let mut server = McpServer::default();
    assert!(server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .is_none());
    assert!(server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":4}}"#)
        .is_none());
    assert!(server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/unknown"}"#)
        .is_none());
    assert!(server.session().is_initialized());
}

#[test]
fn test_set_log_level() {
    let mut server = McpServer::default();
    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"logging/setLevel","params":{"level":"error"}}"#,
    );
    assert_eq!(value["result"], json!({}));

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"logging/setLevel","params":{"level":"loud"}}"#,
    );
    assert_eq!(value["error"]["code"], -32602);
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_returns_response_batch() {
    let mut server = McpServer::default();
    register_add(&mut server);

    let value = call(
        &mut server,
        r#"[
            {"jsonrpc":"2.0","id":1,"method":"ping"},
            {"jsonrpc":"2.0","method":"notifications/initialized"},
            {"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":1,"b":1}}},
            {"jsonrpc":"2.0","id":3,"method":"does/not/exist"}
        ]"#,
    );

    let replies = value.as_array().unwrap();
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[1]["result"]["content"][0]["text"], "2");
    assert_eq!(replies[2]["error"]["code"], -32601);
}

#[test]
fn test_empty_batch_is_invalid_request() {
    let mut server = McpServer::default();
    let value = call(&mut server, "[]");
    assert_eq!(value["error"]["code"], -32600);
    assert_eq!(value["id"], 0);
}

// =============================================================================
// Pagination Tests
// =============================================================================

#[test]
fn test_tools_list_pagination_visits_every_tool() {
    let mut server = server_with_page_size(2);
    for i in 0..5 {
        server.registry_mut().register_tool(
            Tool::new(format!("tool_{i}"), json!({"type": "object"})).unwrap(),
            handler_fn(|_| Ok(Output::from(()))),
            true,
        );
    }

    let mut names = Vec::new();
    let mut cursor: Option<String> = None;
    for id in 0.. {
        let params = cursor.as_ref().map_or_else(|| json!({}), |c| json!({"cursor": c}));
        let request = json!({"jsonrpc": "2.0", "id": id, "method": "tools/list", "params": params});
        let value = call(&mut server, &request.to_string());
        let result = &value["result"];
        for tool in result["tools"].as_array().unwrap() {
            names.push(tool["name"].as_str().unwrap().to_string());
        }
        match result.get("nextCursor").and_then(Value::as_str) {
            Some(next) => cursor = Some(next.to_string()),
            None => break,
        }
    }

    assert_eq!(names, ["tool_0", "tool_1", "tool_2", "tool_3", "tool_4"]);
}

#[test]
fn test_unknown_cursor_is_invalid_params() {
    let mut server = McpServer::default();
    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"prompts/list","params":{"cursor":"nope"}}"#,
    );
    assert_eq!(value["error"]["code"], -32602);
}

// =============================================================================
// Resource and Prompt Tests
// =============================================================================

#[test]
fn test_resource_template_read() {
    let mut server = McpServer::default();
    server
        .registry_mut()
        .register_resource_template(
            ResourceTemplate::new("users://{id}/profile", "profile")
                .unwrap()
                .with_mime_type("application/json"),
            handler_fn(|args| Ok(json!({"id": args["id"], "active": true}).into())),
            true,
        )
        .unwrap();

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"resources/read","params":{"uri":"users://42/profile"}}"#,
    );
    let contents = &value["result"]["contents"][0];
    assert_eq!(contents["uri"], "users://42/profile");
    assert_eq!(contents["mimeType"], "application/json");
    let body: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({"id": "42", "active": true}));

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/templates/list"}"#,
    );
    assert_eq!(
        value["result"]["resourceTemplates"][0]["uriTemplate"],
        "users://{id}/profile"
    );
}

#[test]
fn test_unknown_resource_is_resource_not_found() {
    let mut server = McpServer::default();
    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"resources/read","params":{"uri":"nothing://here"}}"#,
    );
    assert_eq!(value["error"]["code"], -32002);

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/subscribe","params":{"uri":"nothing://here"}}"#,
    );
    assert_eq!(value["error"]["code"], -32002);
}

#[test]
fn test_subscribe_to_known_resource() {
    let mut server = McpServer::default();
    server.registry_mut().register_resource(
        Resource::new("config://app", "app").unwrap(),
        handler_fn(|_| Ok("{}".into())),
        true,
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"resources/subscribe","params":{"uri":"config://app"}}"#,
    );
    assert_eq!(value["result"], json!({}));
    assert!(server.session().is_subscribed("config://app"));

    call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"resources/unsubscribe","params":{"uri":"config://app"}}"#,
    );
    assert!(!server.session().is_subscribed("config://app"));
}

#[test]
fn test_prompt_get_and_completion() {
    let mut server = McpServer::default();
    server.registry_mut().register_prompt(
        Prompt::new("greet")
            .unwrap()
            .with_description("Greets someone")
            .with_argument(PromptArgument::new("name").required()),
        handler_fn(|args| Ok(format!("Hello, {}!", args["name"].as_str().unwrap_or("?")).into())),
        true,
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":1,"method":"prompts/get","params":{"name":"greet","arguments":{"name":"Ada"}}}"#,
    );
    let result = &value["result"];
    assert_eq!(result["description"], "Greets someone");
    assert_eq!(result["messages"][0]["role"], "user");
    assert_eq!(result["messages"][0]["content"]["text"], "Hello, Ada!");

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":2,"method":"prompts/get","params":{"name":"greet"}}"#,
    );
    assert_eq!(value["error"]["code"], -32602);

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":3,"method":"completion/complete","params":{"ref":{"type":"ref/prompt","name":"greet"},"argument":{"name":"name","value":"A"}}}"#,
    );
    assert_eq!(
        value["result"]["completion"],
        json!({"values": [], "total": 0, "hasMore": false})
    );

    let value = call(
        &mut server,
        r#"{"jsonrpc":"2.0","id":4,"method":"completion/complete","params":{"ref":{"type":"ref/prompt","name":"nobody"},"argument":{"name":"name","value":""}}}"#,
    );
    assert_eq!(value["error"]["code"], -32602);
}
