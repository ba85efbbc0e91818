//! The gateway's single long-lived connection to its tool server.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, Implementation, InitializeParams, InitializeResult, JsonRpcRequest,
    ListToolsResult, ToolInfo,
};
use crate::result::{ToolResult, is_error_result};
use crate::transport::{HttpTransport, HttpTransportConfig};

/// Where the tool server lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct McpServerConfig {
    /// Label for log lines.
    pub name: String,
    /// Endpoint URL.
    pub url: String,
    /// HTTP headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl McpServerConfig {
    pub fn http(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    /// Sent on every request, e.g. an `Authorization` header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn transport_config(&self) -> HttpTransportConfig {
        let mut http_config = HttpTransportConfig::new(&self.url);
        if let Some(timeout) = self.timeout {
            http_config = http_config.with_timeout(timeout);
        }
        for (key, value) in &self.headers {
            http_config = http_config.with_header(key, value);
        }
        http_config
    }
}

/// The tool-call surface the gateway depends on.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Call a tool by name and classify its result.
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolResult>;

    /// List the tools the peer exposes.
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    /// Re-run the handshake after a connection-level failure.
    async fn reconnect(&self) -> Result<()>;

    /// False once a connection-level failure has been observed.
    fn is_connected(&self) -> bool;
}

/// An invoker that can be shared across handlers.
pub type SharedInvoker = Arc<dyn ToolInvoker>;

/// One instance is created at startup and shared by every request. Calls never
/// share buffers; a connection-level failure flips the client into a broken
/// state where every call fails fast until [`McpClient::reconnect`] succeeds.
#[derive(Debug)]
pub struct McpClient {
    config: McpServerConfig,
    transport: HttpTransport,
    server_info: RwLock<Option<Implementation>>,
    request_id: AtomicU64,
    broken: RwLock<Option<String>>,
}

impl McpClient {
    /// Connect and complete the MCP handshake.
    ///
    /// Fails if the server is unreachable or rejects `initialize`.
    pub async fn connect(config: McpServerConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.transport_config())?;
        let client = Self {
            config,
            transport,
            server_info: RwLock::new(None),
            request_id: AtomicU64::new(1),
            broken: RwLock::new(None),
        };
        let info = client.handshake().await?;
        *client.server_info.write() = Some(info);
        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// What the peer reported about itself during the handshake.
    pub fn server_info(&self) -> Option<Implementation> {
        self.server_info.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.server_info.read().is_some()
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_connection(&self) -> Result<()> {
        match self.broken.read().as_ref() {
            Some(cause) => Err(McpError::ConnectionBroken(cause.clone())),
            None => Ok(()),
        }
    }

    fn note_failure(&self, err: &McpError) {
        if err.is_connection_fault() && !matches!(err, McpError::ConnectionBroken(_)) {
            tracing::error!(server = %self.config.name, error = %err, "MCP connection lost");
            *self.broken.write() = Some(err.to_string());
        }
    }

    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let request = JsonRpcRequest::call(self.next_request_id(), method, params);

        let response = self
            .transport
            .send_request(&request)
            .await
            .inspect_err(|e| self.note_failure(e))?;

        response
            .into_result()
            .map_err(|e| McpError::server_error(e.code, e.message, e.data))
    }

    /// Run `initialize` and `notifications/initialized`. The caller decides
    /// when to publish the returned server identity.
    async fn handshake(&self) -> Result<Implementation> {
        let params = InitializeParams::default();
        let result = self
            .send_request("initialize", Some(serde_json::to_value(&params)?))
            .await?;
        let init_result: InitializeResult = serde_json::from_value(result)?;

        tracing::info!(
            server = %init_result.server_info.name,
            version = %init_result.server_info.version,
            protocol = %init_result.protocol_version,
            "MCP server initialized"
        );

        self.transport
            .send_notification(&JsonRpcRequest::notification("notifications/initialized"))
            .await?;

        Ok(init_result.server_info)
    }

    /// Call a tool and return the raw `result` object.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value> {
        self.check_connection()?;
        if !self.is_initialized() {
            return Err(McpError::NotInitialized);
        }

        let params = CallToolParams {
            name,
            arguments: arguments.unwrap_or_else(|| Value::Object(Default::default())),
        };
        self.send_request("tools/call", Some(serde_json::to_value(&params)?))
            .await
    }

    /// Close the session on the peer. Errors are logged and swallowed.
    pub async fn shutdown(&self) {
        tracing::info!(server = %self.config.name, "closing MCP session");
        self.transport.terminate().await;
        *self.server_info.write() = None;
    }
}

#[async_trait]
impl ToolInvoker for McpClient {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let raw = self.call_tool(name, Some(arguments)).await.inspect_err(|e| {
            tracing::warn!(server = %self.config.name, tool = %name, error = %e, "tool call failed");
        })?;

        if is_error_result(&raw) {
            let message = ToolResult::from_value(raw).text();
            tracing::warn!(server = %self.config.name, tool = %name, "tool call returned error");
            return Err(McpError::tool_error(message));
        }

        tracing::debug!(server = %self.config.name, tool = %name, "tool call succeeded");
        Ok(ToolResult::from_value(raw))
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        self.check_connection()?;
        let result = self.send_request("tools/list", None).await?;
        let list_result: ListToolsResult = serde_json::from_value(result)?;

        tracing::debug!(
            server = %self.config.name,
            tool_count = list_result.tools.len(),
            "listed MCP tools"
        );

        Ok(list_result.tools)
    }

    async fn reconnect(&self) -> Result<()> {
        tracing::info!(server = %self.config.name, url = %self.transport.url(), "reconnecting to MCP server");
        self.transport.clear_session();
        match self.handshake().await {
            Ok(info) => {
                *self.server_info.write() = Some(info);
                *self.broken.write() = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(server = %self.config.name, error = %e, "MCP reconnect failed");
                *self.broken.write() = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.broken.read().is_none() && self.is_initialized()
    }
}
