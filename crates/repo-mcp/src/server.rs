//! MCP Server implementation
//!
//! Maps the MCP tool methods onto a [`Gateway`]. Messages are
//! line-delimited JSON-RPC 2.0. Each message is handled on its own task, so
//! responses may come back in a different order than the requests; clients
//! match them by `id`.

use std::sync::Arc;

use repo_core::Gateway;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability,
};
use crate::{Error, Result};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "repo-gateway";

/// MCP server wrapping an initialized [`Gateway`]
///
/// # Example
///
/// ```ignore
/// let gateway = Gateway::new(config, Environment::from_process()?);
/// gateway.initialize().await?;
/// GatewayServer::new(gateway).run().await?;
/// ```
#[derive(Clone)]
pub struct GatewayServer {
    gateway: Arc<Gateway>,
}

impl GatewayServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Serve stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("MCP server ready, listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve one message per line from `reader`, writing one response per
    /// line to `writer`.
    ///
    /// A slow request only delays its own response. Once `reader` closes,
    /// requests still in flight are allowed to finish before returning.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let read = async move {
            let mut tasks = JoinSet::new();
            let mut lines = reader.lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                tracing::debug!(request = %line, "Received message");

                let server = self.clone();
                let tx = tx.clone();
                tasks.spawn(async move {
                    if let Some(response) = server.respond(&line).await {
                        // the writer only goes away after every sender
                        let _ = tx.send(response);
                    }
                });
            }

            tracing::info!(in_flight = tasks.len(), "Input closed, finishing requests");
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Request task aborted");
                }
            }
            Ok::<_, Error>(())
        };

        let write = async move {
            while let Some(response) = rx.recv().await {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<_, Error>(())
        };

        let (read, write) = tokio::join!(read, write);
        read?;
        write?;
        tracing::info!("Shutting down");
        Ok(())
    }

    /// Serialized response for one line, `None` for notifications.
    async fn respond(&self, line: &str) -> Option<String> {
        match self.handle_message(line).await {
            Ok(response) => response,
            Err(e) => {
                let error =
                    JsonRpcResponse::error(None, INTERNAL_ERROR, format!("Internal error: {e}"));
                match serde_json::to_string(&error) {
                    Ok(response) => Some(response),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to serialize error response");
                        None
                    }
                }
            }
        }
    }

    /// Handle a single raw message.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Result<Option<String>> {
        let value: Value = match serde_json::from_str(message) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable message");
                let response = JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}"));
                return Ok(Some(serde_json::to_string(&response)?));
            }
        };

        let id = value.get("id").filter(|id| !id.is_null()).cloned();
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {e}"));
                return Ok(Some(serde_json::to_string(&response)?));
            }
        };

        match self.handle_request(request).await? {
            Some(response) => Ok(Some(serde_json::to_string(&response)?)),
            None => Ok(None),
        }
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let notification = request.is_notification();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "initialized" | "notifications/initialized" => return Ok(None),
            "tools/list" => self.handle_tools_list(request.id).await?,
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            method => {
                tracing::debug!(method, "Unknown method");
                JsonRpcResponse::error(
                    request.id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                )
            }
        };

        if notification {
            return Ok(None);
        }
        Ok(Some(response))
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    async fn handle_tools_list(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let tools = serde_json::to_value(self.gateway.list_tools().await)?;
        Ok(JsonRpcResponse::success(id, json!({ "tools": tools })))
    }

    /// Tool failures are successful responses whose result has
    /// `isError: true`; only malformed params are protocol errors.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
            }
        };

        tracing::debug!(tool = %params.name, "Calling tool");
        let result = self.gateway.call_tool(&params.name, params.arguments).await;
        let result = serde_json::to_value(result).map_err(Error::from)?;
        Ok(JsonRpcResponse::success(id, result))
    }
}
