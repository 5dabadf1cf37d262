//! Stdio MCP server: message routing and tool dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_PARAMS, Implementation,
    InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, MCP_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
    RequestId, ServerCapabilities, Tool, ToolContent, ToolsCapability,
};

/// Tool execution seam; one implementation per exposed tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult>;
}

/// MCP server over stdio. Tools are registered before serving starts, so the
/// registries need no locking while the message loop runs.
pub struct McpServer {
    server_info: Implementation,
    tools: Vec<Tool>,
    handlers: HashMap<String, Box<dyn ToolHandler>>,
}

impl McpServer {
    #[inline]
    pub fn new(name: String, version: String) -> Self {
        Self {
            server_info: Implementation { name, version },
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool and its handler.
    #[inline]
    pub fn register_tool<H>(&mut self, tool: Tool, handler: H)
    where
        H: ToolHandler + 'static,
    {
        debug!("Registered tool: {}", tool.name);
        self.handlers.insert(tool.name.clone(), Box::new(handler));
        self.tools.push(tool);
    }

    /// Serve requests over stdin/stdout until EOF.
    #[inline]
    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        info!("Starting MCP server with stdio transport");

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                info!("stdin closed, shutting down MCP server");
                break;
            }

            let message = line.trim();
            if message.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(message).await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Process one raw message; `None` means nothing should be written back
    /// (notifications and unparseable non-requests).
    pub(crate) async fn handle_message(&self, raw: &str) -> Option<String> {
        if let Ok(request) = serde_json::from_str::<JsonRpcRequest>(raw) {
            let response = self.handle_request(request).await;
            return serialize_response(&response);
        }

        if let Ok(notification) = serde_json::from_str::<JsonRpcNotification>(raw) {
            debug!("Ignoring notification: {}", notification.method);
            return None;
        }

        warn!("Failed to parse incoming message");
        let error = JsonRpcErrorResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            error: JsonRpcError {
                code: PARSE_ERROR,
                message: "Parse error".to_string(),
                data: None,
            },
            id: None,
        };
        serde_json::to_string(&error).ok()
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> ServerResponse {
        debug!("Handling request: {}", request.method);

        match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: MCP_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                    },
                    server_info: self.server_info.clone(),
                };
                success(request.id, json!(result))
            }
            "ping" => success(request.id, json!({})),
            "tools/list" => {
                let result = ListToolsResult {
                    tools: self.tools.clone(),
                };
                success(request.id, json!(result))
            }
            "tools/call" => self.handle_tool_call(request).await,
            other => {
                warn!("Unknown method: {}", other);
                failure(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {other}"),
                )
            }
        }
    }

    async fn handle_tool_call(&self, request: JsonRpcRequest) -> ServerResponse {
        let params: CallToolParams = match request
            .params
            .map(serde_json::from_value)
            .transpose()
        {
            Ok(Some(params)) => params,
            Ok(None) => {
                return failure(
                    request.id,
                    INVALID_PARAMS,
                    "Missing tools/call parameters".to_string(),
                );
            }
            Err(e) => {
                return failure(
                    request.id,
                    INVALID_PARAMS,
                    format!("Invalid tools/call parameters: {e}"),
                );
            }
        };

        let Some(handler) = self.handlers.get(&params.name) else {
            return failure(
                request.id,
                METHOD_NOT_FOUND,
                format!("Unknown tool: {}", params.name),
            );
        };

        match handler.handle(params).await {
            Ok(result) => success(request.id, json!(result)),
            Err(e) => {
                // Tool-level failures stay inside the tool result so the
                // transport keeps flowing.
                error!("Tool execution failed: {e:#}");
                let result = CallToolResult {
                    content: vec![ToolContent::Text {
                        text: format!("Tool execution failed: {e:#}"),
                    }],
                    is_error: Some(true),
                };
                success(request.id, json!(result))
            }
        }
    }
}

enum ServerResponse {
    Success(JsonRpcResponse),
    Failure(JsonRpcErrorResponse),
}

fn success(id: RequestId, result: serde_json::Value) -> ServerResponse {
    ServerResponse::Success(JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        result,
        id,
    })
}

fn failure(id: RequestId, code: i32, message: String) -> ServerResponse {
    ServerResponse::Failure(JsonRpcErrorResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        error: JsonRpcError {
            code,
            message,
            data: None,
        },
        id: Some(id),
    })
}

fn serialize_response(response: &ServerResponse) -> Option<String> {
    let serialized = match response {
        ServerResponse::Success(r) => serde_json::to_string(r),
        ServerResponse::Failure(r) => serde_json::to_string(r),
    };
    match serialized {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize response: {e}");
            let fallback = JsonRpcErrorResponse {
                jsonrpc: JSONRPC_VERSION.to_string(),
                error: JsonRpcError {
                    code: INTERNAL_ERROR,
                    message: "Failed to serialize response".to_string(),
                    data: None,
                },
                id: None,
            };
            serde_json::to_string(&fallback).ok()
        }
    }
}
