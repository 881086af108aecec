//! capability-mcp: MCP server core for registered tools, resources and prompts
//!
//! This library implements the protocol engine of a Model Context Protocol
//! server: JSON-RPC 2.0 message handling, a registry of capabilities with
//! their handlers, and coercion of handler results into protocol content.
//!
//! # Architecture
//!
//! Hosts register capabilities; the server exposes them:
//!
//! - **Registration**: Tools, resources, resource templates and prompts, each
//!   bound to a [`registry::Handler`], either in code (manual) or from the
//!   configuration [`manifest`] (discovered)
//! - **Dispatch**: Requests routed to method handlers, errors mapped to
//!   JSON-RPC codes
//! - **Coercion**: Whatever a handler returns normalised into text, image,
//!   audio or embedded-resource content
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`manifest`]: Capabilities declared in the configuration file
//! - [`mcp`]: MCP protocol implementation
//! - [`model`]: Capability definitions and content types
//! - [`registry`]: Capability registry, argument binding and coercion

pub mod config;
pub mod error;
pub mod manifest;
pub mod mcp;
pub mod model;
pub mod registry;
