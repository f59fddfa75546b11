//! MCP server core: request dispatch and the stdio transport loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};

use spice_mcp_types::{
    CallToolParams, CallToolResult, CancelledNotification, Implementation, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, LogLevel, RequestId, ServerCapabilities, SetLogLevelParams, Tool, methods,
};

use crate::handlers::ToolHandler;

/// MCP server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server is not initialized.
    Uninitialized,
    /// Server received `initialize` and is waiting for the
    /// `initialized` notification.
    Initializing,
    /// Server is ready to handle requests.
    Ready,
    /// Server has stopped.
    Stopped,
}

/// MCP server with a tool registry and a newline-delimited stdio transport.
pub struct McpServer {
    /// Server implementation info.
    pub(crate) info: Implementation,
    /// Server capabilities.
    pub(crate) capabilities: ServerCapabilities,
    /// Registered tool handlers, keyed by tool name.
    pub(crate) tools: RwLock<HashMap<String, Arc<dyn ToolHandler>>>,
    /// Current log level.
    pub(crate) log_level: RwLock<LogLevel>,
    /// Server state.
    pub(crate) state: RwLock<ServerState>,
    /// Whether the transport loop is running.
    pub(crate) running: AtomicBool,
    /// Client info (set after initialization).
    pub(crate) client_info: RwLock<Option<Implementation>>,
    /// Optional instructions for clients.
    pub(crate) instructions: Option<String>,
}

impl McpServer {
    /// Get server info.
    pub fn info(&self) -> &Implementation {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Get current state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// Register a tool handler.
    pub async fn register_tool(&self, handler: Arc<dyn ToolHandler>) {
        let tool = handler.tool();
        let name = tool.name.clone();
        self.tools.write().await.insert(name.clone(), handler);
        debug!(tool = %name, "Registered tool");
    }

    /// Get all registered tools.
    pub async fn tools(&self) -> Vec<Tool> {
        self.tools.read().await.values().map(|h| h.tool()).collect()
    }

    /// Get current log level.
    pub async fn log_level(&self) -> LogLevel {
        *self.log_level.read().await
    }

    // ========================================================================
    // Request handlers
    // ========================================================================

    /// Handle a JSON-RPC request.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %request.method, id = %request.id, "Handling request");

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params).await,
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => self.handle_list_tools().await,
            methods::TOOLS_CALL => self.handle_call_tool(request.params).await,
            methods::LOGGING_SET_LEVEL => self.handle_set_log_level(request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        }
    }

    /// Handle a JSON-RPC notification.
    pub async fn handle_notification(&self, notification: JsonRpcNotification) {
        debug!(method = %notification.method, "Handling notification");

        match notification.method.as_str() {
            methods::INITIALIZED => {
                *self.state.write().await = ServerState::Ready;
                info!("Server initialized and ready");
            }
            methods::CANCELLED => {
                // Cancellation is accepted but not propagated: a running
                // engine process always runs to completion.
                if let Some(params) = notification.params
                    && let Ok(cancelled) = serde_json::from_value::<CancelledNotification>(params)
                {
                    debug!(
                        request_id = %cancelled.request_id,
                        reason = cancelled.reason.as_deref().unwrap_or(""),
                        "Cancellation received, invocation runs to completion"
                    );
                }
            }
            _ => {
                warn!(method = %notification.method, "Unknown notification");
            }
        }
    }

    async fn handle_initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        // Hold the write lock across check and transition so concurrent
        // initialize requests cannot both pass the uninitialized check.
        {
            let mut state_guard = self.state.write().await;
            if *state_guard != ServerState::Uninitialized {
                return Err(JsonRpcError::invalid_request("Server already initialized"));
            }
            *state_guard = ServerState::Initializing;
        }

        let init_params: InitializeParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?
            .unwrap_or_default();

        *self.client_info.write().await = Some(init_params.client_info.clone());

        info!(
            client = %init_params.client_info.name,
            version = %init_params.client_info.version,
            protocol = %init_params.protocol_version,
            "Client connected"
        );

        let result = InitializeResult {
            protocol_version: spice_mcp_types::PROTOCOL_VERSION.to_string(),
            capabilities: self.capabilities.clone(),
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let tools = self.tools().await;
        let result = ListToolsResult::new(tools);
        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let call_params: CallToolParams = serde_json::from_value(
            params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?,
        )
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        debug!(tool = %call_params.name, "Calling tool");

        let handlers = self.tools.read().await;
        let handler = handlers.get(&call_params.name).cloned();
        drop(handlers);

        // An unknown tool name is a tool-level error, not a protocol fault:
        // the invocation was well-formed, the dispatch target is wrong.
        let result = match handler {
            Some(handler) => {
                let arguments = call_params.arguments.unwrap_or(json!({}));
                handler.execute(arguments).await
            }
            None => Ok(CallToolResult::error(format!(
                "Unknown tool: {}",
                call_params.name
            ))),
        };

        let call_result = match result {
            Ok(call_result) => call_result,
            Err(e) => CallToolResult::error(e.to_string()),
        };
        serde_json::to_value(call_result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_set_log_level(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let level_params: SetLogLevelParams = serde_json::from_value(
            params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?,
        )
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))?;

        *self.log_level.write().await = level_params.level;
        debug!(level = %level_params.level, "Log level changed");

        Ok(json!({}))
    }

    // ========================================================================
    // Transport: stdio
    // ========================================================================

    /// Run the server over stdin/stdout until EOF.
    ///
    /// Requests and notifications arrive newline-delimited on stdin;
    /// responses are written newline-delimited to stdout. Each request is
    /// handled in its own task, so slow tool invocations do not block the
    /// read loop and responses may complete in any order. All logging goes
    /// to stderr so the protocol channel stays clean.
    pub async fn run_stdio(self: Arc<Self>) -> Result<()> {
        info!(server = %self.info.name, "Starting MCP server with stdio transport");
        self.running.store(true, Ordering::SeqCst);

        let mut reader = BufReader::new(tokio::io::stdin());

        // Single writer task serializes concurrent responses onto stdout.
        let (response_tx, mut response_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(json) = response_rx.recv().await {
                if stdout.write_all(json.as_bytes()).await.is_err()
                    || stdout.write_all(b"\n").await.is_err()
                    || stdout.flush().await.is_err()
                {
                    error!("Failed to write response to stdout");
                    break;
                }
            }
        });

        let mut line = String::new();

        while self.running.load(Ordering::SeqCst) {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!("EOF received, shutting down");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(trimmed) {
                        let server = self.clone();
                        let tx = response_tx.clone();
                        tokio::spawn(async move {
                            let response = server.handle_request(request).await;
                            match serde_json::to_string(&response) {
                                Ok(json) => {
                                    let _ = tx.send(json);
                                }
                                Err(e) => error!(error = %e, "Failed to serialize response"),
                            }
                        });
                    } else if let Ok(notification) =
                        serde_json::from_str::<JsonRpcNotification>(trimmed)
                    {
                        self.handle_notification(notification).await;
                    } else {
                        warn!(line = %trimmed, "Invalid JSON-RPC message");
                        let error_response = JsonRpcResponse::error(
                            RequestId::Number(0),
                            JsonRpcError::parse_error("Invalid JSON"),
                        );
                        let error_json = serde_json::to_string(&error_response)
                            .context("Failed to serialize parse error")?;
                        let _ = response_tx.send(error_json);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Error reading from stdin");
                    break;
                }
            }
        }

        // Close the channel so the writer drains in-flight responses and exits.
        drop(response_tx);
        writer.await.context("stdout writer task failed")?;

        *self.state.write().await = ServerState::Stopped;
        self.running.store(false, Ordering::SeqCst);
        info!("MCP server stopped");

        Ok(())
    }

    /// Stop the server loop.
    pub async fn stop(&self) {
        info!("Stopping MCP server");
        self.running.store(false, Ordering::SeqCst);
    }
}
