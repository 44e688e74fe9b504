//! Tool host: serves a [`LocalRegistry`] over newline-delimited JSON-RPC.
//!
//! Handles `initialize`, `ping`, `tools/list` and `tools/call`. Notifications
//! are accepted and dropped. Tool failures come back as `isError` results;
//! protocol failures as JSON-RPC errors.

use planloop_core::tool::LocalRegistry;
use planloop_core::{Arguments, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::rpc::{
    CallToolParams, CallToolResult, INVALID_PARAMS, INVALID_REQUEST, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ToolInfo,
};

const SERVER_NAME: &str = "planloop-tools";

pub struct ToolHost {
    registry: LocalRegistry,
}

impl ToolHost {
    pub fn new(registry: LocalRegistry) -> Self {
        Self { registry }
    }

    /// Serve until `reader` reaches end of input.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = SERVER_NAME, tools = self.registry.len(), "Tool host ready");

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(line).await {
                let mut json = serde_json::to_string(&response)?;
                json.push('\n');
                writer.write_all(json.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        info!("Tool host input closed");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Unparseable message");
                return Some(JsonRpcResponse::failure(
                    serde_json::Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ));
            }
        };

        let id = raw.get("id").cloned().unwrap_or(serde_json::Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::failure(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        }
    }

    /// Answer one request. Notifications get no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification ignored");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            ),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => {
                let result = ListToolsResult {
                    tools: self
                        .registry
                        .descriptors()
                        .into_iter()
                        .map(ToolInfo::from)
                        .collect(),
                    next_cursor: None,
                };
                match serde_json::to_value(result) {
                    Ok(v) => JsonRpcResponse::success(id, v),
                    Err(e) => JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string()),
                }
            }
            "tools/call" => self.call_tool(id, request.params).await,
            other => {
                warn!(method = %other, "Unknown method");
                JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };
        Some(response)
    }

    async fn call_tool(
        &self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params: CallToolParams =
            match serde_json::from_value(params.unwrap_or(serde_json::Value::Null)) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::failure(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid tools/call params: {e}"),
                    );
                }
            };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::failure(
                id,
                INVALID_PARAMS,
                format!("Unknown tool: {}", params.name),
            );
        };

        let arguments: Arguments = params
            .arguments
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();

        let start = std::time::Instant::now();
        let result = match tool.execute(&arguments).await {
            Ok(value) => CallToolResult::success(&value),
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool failed");
                CallToolResult::failure(e.to_string())
            }
        };
        debug!(
            tool = %params.name,
            is_error = result.is_error,
            duration_ms = start.elapsed().as_millis() as u64,
            "Tool call handled"
        );

        match serde_json::to_value(result) {
            Ok(v) => JsonRpcResponse::success(id, v),
            Err(e) => JsonRpcResponse::failure(id, INVALID_REQUEST, e.to_string()),
        }
    }
}
