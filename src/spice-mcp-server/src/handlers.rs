//! Tool handler trait and helpers.

use anyhow::Result;
use serde_json::Value;
use spice_mcp_types::{CallToolResult, Tool};

/// Trait implemented by each tool the server exposes.
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition.
    fn tool(&self) -> Tool;

    /// Execute the tool with given arguments.
    ///
    /// An `Err` here is converted by the server into an error-flagged
    /// `CallToolResult`, never into a JSON-RPC fault.
    async fn execute(&self, arguments: Value) -> Result<CallToolResult>;
}

/// A function-based tool handler, mostly useful in tests.
pub struct FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    tool: Tool,
    handler: F,
}

impl<F> FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    /// Create a new function-based tool handler.
    pub fn new(tool: Tool, handler: F) -> Self {
        Self { tool, handler }
    }
}

#[async_trait::async_trait]
impl<F> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Result<CallToolResult> + Send + Sync,
{
    fn tool(&self) -> Tool {
        self.tool.clone()
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        (self.handler)(arguments)
    }
}
