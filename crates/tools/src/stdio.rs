//! `StdioRegistry`: a [`ToolRegistry`] backed by a tool host process.
//!
//! Speaks newline-delimited JSON-RPC to the child's stdin/stdout. Every
//! request is bounded by the configured timeout.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::{ToolDescriptor, ToolRegistry};
use planloop_core::{Arguments, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::rpc::{
    CallToolResult, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION,
};

type BoxedReader = BufReader<Box<dyn AsyncRead + Send + Unpin>>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Writer and reader are locked together so each request meets its own response.
///
/// `pending` outlives a timed-out read, so a half-received line is completed
/// by the next request instead of being dropped.
struct Channel {
    writer: BoxedWriter,
    reader: BoxedReader,
    pending: Vec<u8>,
}

pub struct StdioRegistry {
    channel: Mutex<Channel>,
    next_id: AtomicU64,
    timeout: Duration,
    child: Option<Mutex<Child>>,
}

impl StdioRegistry {
    /// Spawn `command` and complete the `initialize` handshake.
    ///
    /// The child's stderr is inherited so its logs land next to ours.
    pub async fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, ToolError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| ToolError::Transport(format!("failed to spawn tool host '{command}': {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::Transport("tool host stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolError::Transport("tool host stdout unavailable".into()))?;

        info!(command, ?args, "Spawned tool host");

        let mut registry = Self::from_streams(stdout, stdin, timeout);
        registry.child = Some(Mutex::new(child));
        registry.initialize().await?;
        Ok(registry)
    }

    /// Wrap an already-connected pair of streams. Call [`initialize`](Self::initialize)
    /// before use.
    pub fn from_streams<R, W>(reader: R, writer: W, timeout: Duration) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            channel: Mutex::new(Channel {
                writer: Box::new(writer),
                reader: BufReader::new(reader),
                pending: Vec::new(),
            }),
            next_id: AtomicU64::new(1),
            timeout,
            child: None,
        }
    }

    /// The `initialize` request followed by the `notifications/initialized` notification.
    pub async fn initialize(&self) -> Result<(), ToolError> {
        let result = self
            .request(
                "initialize",
                Some(serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": "planloop",
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
                "initialize",
            )
            .await?;

        debug!(server = %result["serverInfo"], "Tool host initialized");

        let mut channel = self.channel.lock().await;
        write_message(&mut channel.writer, &JsonRpcRequest::notification("notifications/initialized")).await
    }

    /// Kill the tool host process, if this registry spawned one.
    pub async fn shutdown(&self) {
        if let Some(child) = &self.child {
            let mut child = child.lock().await;
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to stop tool host");
            }
        }
    }

    /// Send one request and wait for its result. `label` names the operation
    /// in timeout errors.
    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        label: &str,
    ) -> Result<serde_json::Value, ToolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let response = tokio::time::timeout(self.timeout, self.exchange(id, &request))
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: label.to_string(),
                timeout_secs: self.timeout.as_secs(),
            })??;

        if let Some(error) = response.error {
            return Err(ToolError::ExecutionFailed {
                tool_name: label.to_string(),
                reason: error.to_string(),
            });
        }
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }

    async fn exchange(&self, id: u64, request: &JsonRpcRequest) -> Result<JsonRpcResponse, ToolError> {
        let mut channel = self.channel.lock().await;
        write_message(&mut channel.writer, request).await?;

        // Responses to earlier, abandoned requests are skipped.
        let Channel { reader, pending, .. } = &mut *channel;
        loop {
            let read = reader
                .read_until(b'\n', pending)
                .await
                .map_err(|e| ToolError::Transport(format!("failed to read from tool host: {e}")))?;
            if read == 0 {
                return Err(ToolError::Transport("tool host closed the connection".into()));
            }

            let bytes = std::mem::take(pending);
            let line = String::from_utf8_lossy(&bytes);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(line)
                .map_err(|e| ToolError::Transport(format!("invalid JSON from tool host: {e}")))?;
            if value.get("id").is_none() {
                debug!(message = %value, "Skipping notification from tool host");
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)
                .map_err(|e| ToolError::Transport(format!("invalid JSON-RPC response: {e}")))?;
            if response.id.as_u64() == Some(id) {
                return Ok(response);
            }
            debug!(expected = id, got = %response.id, "Skipping stale response");
        }
    }
}

async fn write_message(writer: &mut BoxedWriter, request: &JsonRpcRequest) -> Result<(), ToolError> {
    let mut json = serde_json::to_string(request)
        .map_err(|e| ToolError::Transport(format!("failed to encode request: {e}")))?;
    json.push('\n');

    let io = |e: std::io::Error| ToolError::Transport(format!("failed to write to tool host: {e}"));
    writer.write_all(json.as_bytes()).await.map_err(io)?;
    writer.flush().await.map_err(io)
}

#[async_trait]
impl ToolRegistry for StdioRegistry {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolError> {
        let mut descriptors = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor
                .as_ref()
                .map(|c| serde_json::json!({ "cursor": c }));
            let result = self.request("tools/list", params, "tools/list").await?;
            let page: ListToolsResult = serde_json::from_value(result)
                .map_err(|e| ToolError::Transport(format!("invalid tools/list result: {e}")))?;

            descriptors.extend(page.tools.into_iter().map(ToolDescriptor::from));
            match page.next_cursor {
                Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
                _ => break,
            }
        }
        Ok(descriptors)
    }

    async fn invoke(&self, name: &str, arguments: &Arguments) -> Result<Value, ToolError> {
        let json_arguments: serde_json::Map<String, serde_json::Value> = arguments
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();

        let result = self
            .request(
                "tools/call",
                Some(serde_json::json!({ "name": name, "arguments": json_arguments })),
                name,
            )
            .await?;

        let result: CallToolResult = serde_json::from_value(result)
            .map_err(|e| ToolError::Transport(format!("invalid tools/call result: {e}")))?;

        if result.is_error {
            return Err(ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: result.text(),
            });
        }
        Ok(result.value())
    }
}
