//! Server builder.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use serde_json::Value;
use spice_mcp_types::{CallToolResult, Implementation, LogLevel, ServerCapabilities, Tool};
use tokio::sync::RwLock;

use crate::handlers::{FnToolHandler, ToolHandler};
use crate::server::{McpServer, ServerState};

/// Builder for creating MCP servers.
pub struct McpServerBuilder {
    name: String,
    version: String,
    capabilities: ServerCapabilities,
    tools: Vec<Arc<dyn ToolHandler>>,
    instructions: Option<String>,
}

impl McpServerBuilder {
    /// Create a new server builder.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            capabilities: ServerCapabilities::default(),
            tools: Vec::new(),
            instructions: None,
        }
    }

    /// Enable logging capability.
    pub fn with_logging_capability(mut self) -> Self {
        self.capabilities = self.capabilities.with_logging();
        self
    }

    /// Add a tool handler.
    pub fn tool_handler(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(handler);
        self.capabilities = self.capabilities.with_tools();
        self
    }

    /// Add a tool with a synchronous handler function.
    pub fn tool_fn<F>(mut self, tool: Tool, handler: F) -> Self
    where
        F: Fn(Value) -> Result<CallToolResult> + Send + Sync + 'static,
    {
        self.tool_handler(Arc::new(FnToolHandler::new(tool, handler)))
    }

    /// Set instructions for clients.
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Build the server with all tools registered.
    pub fn build(self) -> Arc<McpServer> {
        let info = Implementation::new(&self.name, &self.version);

        let mut tools: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        for handler in self.tools {
            tools.insert(handler.tool().name, handler);
        }

        Arc::new(McpServer {
            info,
            capabilities: self.capabilities,
            tools: RwLock::new(tools),
            log_level: RwLock::new(LogLevel::Info),
            state: RwLock::new(ServerState::Uninitialized),
            running: AtomicBool::new(false),
            client_info: RwLock::new(None),
            instructions: self.instructions,
        })
    }

    /// Build and run the server with stdio transport.
    pub async fn build_and_run_stdio(self) -> Result<()> {
        self.build().run_stdio().await
    }
}
