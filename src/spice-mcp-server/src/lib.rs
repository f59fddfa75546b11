//! Generic MCP server with a stdio transport.
//!
//! The server owns a tool registry and dispatches the handful of JSON-RPC
//! methods a tools-only MCP server needs: `initialize`, `ping`,
//! `tools/list`, `tools/call` and `logging/setLevel`. Tool handler failures
//! become error-flagged `CallToolResult`s; only a broken transport stops
//! the server.
//!
//! # Example
//! ```rust,no_run
//! use spice_mcp_server::McpServerBuilder;
//! use spice_mcp_types::{CallToolResult, Tool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     McpServerBuilder::new("my-server", "1.0.0")
//!         .tool_fn(Tool::new("hello", "Say hello"), |_args| {
//!             Ok(CallToolResult::text("hello"))
//!         })
//!         .build_and_run_stdio()
//!         .await
//! }
//! ```

mod builder;
mod handlers;
mod server;

pub use builder::McpServerBuilder;
pub use handlers::{FnToolHandler, ToolHandler};
pub use server::{McpServer, ServerState};
