//! MCP Server Implementation
//!
//! Dispatches JSON-RPC requests against the shared tool catalog. The catalog
//! only ever holds tools that passed the mode gate, so `tools/list` never
//! advertises an operation the client may not invoke.

use super::protocol::*;
use super::transport::{MessageTransport, TransportError};
use crate::tools::{ToolCatalog, ToolError};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// MCP Server configuration
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self {
            name: "tessera".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// MCP Server state
pub struct McpServer {
    config: McpServerConfig,
    catalog: Arc<ToolCatalog>,
    initialized: AtomicBool,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl McpServer {
    /// Create a new MCP server builder
    pub fn builder() -> McpServerBuilder {
        McpServerBuilder::new()
    }

    /// Create a server over `catalog` with default config
    pub fn new(catalog: Arc<ToolCatalog>) -> Self {
        Self::builder().with_catalog(catalog).build()
    }

    /// Whether the client completed the initialize handshake
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn catalog(&self) -> &Arc<ToolCatalog> {
        &self.catalog
    }

    /// Handle an incoming message. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(id, JsonRpcError::method_not_found()),
        };
        Some(response)
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::SeqCst);
                debug!("Client initialized");
            }
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params = match params.map(serde_json::from_value::<InitializeParams>).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing initialize params"));
            }
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid initialize params: {}", e)),
                );
            }
        };

        if let Some(client) = &params.client_info {
            info!(client = %client.name, version = %client.version, "Client connected");
        }

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
        };

        success(id, &result)
    }

    async fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let tools = self
            .catalog
            .list()
            .await
            .into_iter()
            .map(|t| McpTool {
                name: t.name,
                description: t.description,
                input_schema: t.input_schema,
            })
            .collect();

        success(id, &ToolsListResult { tools })
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params = match params.map(serde_json::from_value::<ToolCallParams>).transpose() {
            Ok(Some(params)) => params,
            Ok(None) => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing tool call params"));
            }
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tool call params: {}", e)),
                );
            }
        };

        let Some(tool) = self.catalog.get(&params.name).await else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::new(-32002, format!("Tool '{}' not found", params.name)),
            );
        };

        debug!(tool = %params.name, "Calling tool");
        let arguments = match params.arguments {
            Value::Null => json!({}),
            other => other,
        };

        success(id, &tool_call_result(tool.call(arguments).await))
    }

    /// Serve requests until the transport closes
    pub async fn run<T: MessageTransport>(&self, mut transport: T) -> Result<(), TransportError> {
        while let Some(request) = transport.receive().await? {
            if let Some(response) = self.handle_request(request).await {
                transport.send(response).await?;
            }
        }
        debug!("Transport closed");
        Ok(())
    }
}

fn tool_call_result(outcome: Result<Value, ToolError>) -> ToolCallResult {
    match outcome {
        Ok(Value::String(text)) => ToolCallResult {
            content: vec![ContentBlock::text(text)],
            is_error: None,
        },
        Ok(value) => ToolCallResult {
            content: vec![ContentBlock::text(
                serde_json::to_string_pretty(&value).unwrap_or_default(),
            )],
            is_error: None,
        },
        Err(e) => ToolCallResult {
            content: vec![ContentBlock::text(format!("Error: {}", e))],
            is_error: Some(true),
        },
    }
}

fn success<T: Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}

/// Builder for MCP Server
pub struct McpServerBuilder {
    config: McpServerConfig,
    catalog: Option<Arc<ToolCatalog>>,
}

impl McpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: McpServerConfig::default(),
            catalog: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Serve tools from a shared catalog
    pub fn with_catalog(mut self, catalog: Arc<ToolCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn build(self) -> McpServer {
        McpServer {
            config: self.config,
            catalog: self.catalog.unwrap_or_default(),
            initialized: AtomicBool::new(false),
        }
    }
}

impl Default for McpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
