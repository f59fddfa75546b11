//! MCP wire types for the Spice SQL bridge.
//!
//! Type definitions for the subset of the Model Context Protocol the bridge
//! speaks: JSON-RPC 2.0 envelopes, the initialize handshake, tool metadata
//! and tool calls, log levels, and cancellation notifications.
//!
//! # Example
//! ```rust
//! use spice_mcp_types::{PropertySchema, Tool, ToolInputSchema};
//!
//! let tool = Tool::new("spice_sql", "Execute a Spice SQL query").with_schema(
//!     ToolInputSchema::object()
//!         .property("query", PropertySchema::string().description("SQL text"))
//!         .required(vec!["query"]),
//! );
//! ```

mod handshake;
mod jsonrpc;
mod logging;
mod tools;

/// MCP method name constants.
pub mod methods;

/// MCP protocol version this implementation targets.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub use handshake::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, LoggingCapability,
    ServerCapabilities, ToolsCapability,
};
pub use jsonrpc::{
    CancelledNotification, ErrorCode, JSONRPC_VERSION, JsonRpcError, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, RequestId,
};
pub use logging::{LogLevel, LogMessage, SetLogLevelParams};
pub use tools::{
    CallToolParams, CallToolResult, Content, ListToolsResult, PropertySchema, Tool,
    ToolInputSchema,
};
