//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP message layer for exposing registered
//! tools, resources and prompts to AI assistants. The server communicates
//! over a line transport (stdio by default) using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│ Dispatcher  │───▶│   Handlers   │     │
//! │   │   (lines)   │    │  (routing)  │    │  (methods)   │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │          ▲                  │                  │             │
//! │          │                  ▼                  ▼             │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │list_changed │◀───│   Session   │    │   Registry   │     │
//! │   │notifications│    │   (state)   │    │(capabilities)│     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2025-03-26 and also
//! accepts clients speaking 2024-11-05.

pub mod dispatcher;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use dispatcher::{Dispatcher, MethodHandler, RequestContext};
pub use protocol::{
    parse_message, ErrorResponse, Message, Notification, Request, RequestId, Response,
    MCP_PROTOCOL_VERSION,
};
pub use server::{McpServer, ServerSettings};
pub use session::Session;
pub use transport::{LineTransport, StdioTransport};
