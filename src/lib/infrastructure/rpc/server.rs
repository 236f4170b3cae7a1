use crate::constants::SERVER_NAME;
use crate::rpc::types::{RpcRequest, RpcResponse, text_content};
use crate::server::tools::{ToolCallError, ToolRouter};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Transport-independent MCP request dispatcher.
pub struct McpService {
    router: Arc<ToolRouter>,
    initialized: AtomicBool,
}

impl McpService {
    pub fn new(router: Arc<ToolRouter>) -> Self {
        Self {
            router,
            initialized: AtomicBool::new(false),
        }
    }

    pub fn router(&self) -> &Arc<ToolRouter> {
        &self.router
    }

    /// True once the client has sent `notifications/initialized`.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn parse_request(raw: &str) -> Result<RpcRequest, RpcResponse> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| RpcResponse::parse_error(format!("Parse error: {err}")))?;
        let id = value.get("id").cloned();
        serde_json::from_value(value)
            .map_err(|err| RpcResponse::invalid_request(id, format!("Invalid request: {err}")))
    }

    /// Handles one raw JSON-RPC message. Notifications yield `None`.
    pub async fn handle_message(&self, raw: &str) -> Option<RpcResponse> {
        match Self::parse_request(raw) {
            Ok(request) => self.handle(request).await,
            Err(response) => {
                warn!("Rejected malformed JSON-RPC message");
                Some(response)
            }
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "Received JSON-RPC request");

        if request.jsonrpc != "2.0" {
            return Some(RpcResponse::invalid_request(
                request.id,
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "ping" => RpcResponse::success(request.id.clone(), json!({})),
            "tools/list" => self.handle_tool_list(request.id.clone()),
            "tools/call" => self.handle_tool_call(&request).await,
            other => {
                warn!(method = other, "Unknown JSON-RPC method");
                RpcResponse::method_not_found(request.id.clone(), other)
            }
        };
        Some(response)
    }

    fn handle_notification(&self, request: &RpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                self.initialized.store(true, Ordering::Release);
                info!("MCP client initialized");
            }
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, request: &RpcRequest) -> RpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str);
        let version = negotiate_version(requested);
        info!(requested = ?requested, negotiated = version, "Initializing MCP session");

        RpcResponse::success(
            request.id.clone(),
            json!({
                "protocolVersion": version,
                "capabilities": {
                    "tools": { "listChanged": true }
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                }
            }),
        )
    }

    fn handle_tool_list(&self, id: Option<Value>) -> RpcResponse {
        let tools = self.router.list();
        RpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tool_call(&self, request: &RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let Some(Value::Object(params)) = &request.params else {
            return RpcResponse::invalid_params(id, "params must be an object with name");
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(id, "params.name must be a string");
        };
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments.clone(),
            Some(_) => {
                return RpcResponse::invalid_params(id, "params.arguments must be an object");
            }
        };

        let Some(entry) = self.router.get(name) else {
            warn!(tool = name, "Call to unknown tool");
            return RpcResponse::invalid_params(id, format!("Unknown tool: {name}"));
        };

        match entry.handler.call(&arguments).await {
            Ok(output) => RpcResponse::success(
                id,
                json!({
                    "content": [text_content(&output.text)],
                    "isError": output.is_error,
                }),
            ),
            Err(ToolCallError::InvalidArguments(message)) => {
                error!(tool = name, %message, "Tool call rejected");
                RpcResponse::invalid_params(id, message)
            }
        }
    }
}

fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|version| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|supported| *supported == version)
        })
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}
