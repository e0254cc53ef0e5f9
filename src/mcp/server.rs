//! MCP server lifecycle and tool dispatch.
//!
//! 1. **Initialisation**: capability negotiation and version agreement
//! 2. **Operation**: `tools/*`, `prompts/*` and `ping`
//! 3. **Shutdown**: stdin EOF or a signal; the OBS session is closed on exit
//!
//! Messages are handled one at a time. The server owns the bridge by `&mut`,
//! so a tool call always finishes (including any reconnect and scene item
//! lookup) before the next line is read.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::bridge::{CommandBridge, CommandName};
use crate::mcp::prompts;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, RequestId, MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::tools::{self, ToolCallParams, ToolCallResult};
use crate::mcp::transport::StdioTransport;
use crate::obs::Connector;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: Value,
    /// Prompt-related capabilities.
    pub prompts: Value,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: json!({}),
            prompts: json!({}),
        }
    }
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
struct PromptGetParams {
    name: String,
}

/// The MCP server bridging tool calls to OBS.
pub struct McpServer<C: Connector> {
    /// Current server state.
    state: ServerState,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
    /// Command bridge owning the OBS connection.
    bridge: CommandBridge<C>,
}

impl<C: Connector> McpServer<C> {
    /// Creates a new MCP server around a command bridge.
    #[must_use]
    pub const fn new(bridge: CommandBridge<C>) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            protocol_version: None,
            bridge,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated MCP protocol version, once initialised.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Runs the MCP server over stdio until EOF or a shutdown signal, then
    /// closes the OBS session.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        let mut transport = StdioTransport::new();
        let result = self.run_with_shutdown(&mut transport).await;
        self.state = ServerState::ShuttingDown;
        self.bridge.disconnect().await;
        result
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self, transport: &mut StdioTransport) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = transport.read_line() => {
                    if self.handle_transport_result(transport, line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        transport: &mut StdioTransport,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("stdin closed");
            return Ok(true);
        };

        if let Some(reply) = self.handle_line(&line).await {
            transport.write_line(&reply).await?;
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles a single line of input and returns the serialised reply, if
    /// the message warrants one.
    pub async fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }

        let reply = match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => match self.handle_request(&req).await {
                Ok(response) => serde_json::to_string(&response),
                Err(error) => serde_json::to_string(&error),
            },
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                return None;
            }
            Err(error) => serde_json::to_string(&error),
        };

        match reply {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialise reply");
                None
            }
        }
    }

    /// Handles an incoming request.
    async fn handle_request(
        &mut self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "tools/list" => self.handle_tools_list(req),
            "tools/call" => self.handle_tools_call(req).await,
            "prompts/list" => self.handle_prompts_list(req),
            "prompts/get" => self.handle_prompts_get(req),
            "ping" => Ok(JsonRpcResponse::success(req.id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::invalid_request_with(
                req.id.clone(),
                "Server already initialised",
            ));
        }

        let params: InitializeParams = req.parse_params("initialize")?;
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Client connected"
            );
        }

        let negotiated_version = MCP_PROTOCOL_VERSION.to_string();
        self.protocol_version = Some(negotiated_version.clone());
        self.state = ServerState::Initialising;

        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({
                "protocolVersion": negotiated_version,
                "capabilities": ServerCapabilities::default(),
                "serverInfo": ServerInfo::default(),
            }),
        ))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        Ok(JsonRpcResponse::success(
            req.id.clone(),
            json!({ "tools": tools::tool_definitions() }),
        ))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &mut self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: ToolCallParams = req.parse_params("tool call")?;

        let arguments = match params.arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(JsonRpcError::invalid_params(
                    req.id.clone(),
                    "Tool arguments must be an object",
                ))
            }
        };

        let command = tools::command_for_tool(&params.name);
        // Unmapped names still go through the bridge so the caller gets its
        // "Unknown command" result.
        let command_name: &str = match command {
            Some(command) => command.as_str(),
            None => &params.name,
        };

        let mut body = match self.bridge.execute(command_name, &arguments).await {
            Ok(result) => result.to_json(),
            Err(e) => json!({ "status": "error", "message": e.to_string() }),
        };

        if command == Some(CommandName::GetSceneList) && body.get("scenes").is_none() {
            body["scenes"] = json!([]);
        }

        tracing::debug!(tool = %params.name, result = %body, "Tool call finished");

        let result_value = serde_json::to_value(ToolCallResult::from_status(&body)).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(req.id.clone(), "Internal error: failed to serialise result")
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the prompts/list request.
    fn handle_prompts_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;
        Ok(JsonRpcResponse::success(req.id.clone(), prompts::list_prompts()))
    }

    /// Handles the prompts/get request.
    fn handle_prompts_get(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_running(&req.id)?;

        let params: PromptGetParams = req.parse_params("prompt")?;
        let prompt = prompts::get_prompt(&params.name).ok_or_else(|| {
            JsonRpcError::invalid_params(req.id.clone(), format!("Unknown prompt: {}", params.name))
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), prompt))
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::invalid_request_with(
                id.clone(),
                "Server not initialised",
            ));
        }
        Ok(())
    }
}
