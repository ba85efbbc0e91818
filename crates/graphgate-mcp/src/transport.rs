//! Streamable HTTP transport for MCP communication.
//!
//! Each JSON-RPC message is POSTed to a single endpoint. The reply is either a
//! plain JSON body or an SSE stream whose `data:` payloads are JSON-RPC messages.

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{Client, StatusCode, header};

use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};

/// Header carrying the server-assigned session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Endpoint URL of the MCP server (e.g. `http://localhost:8005/mcp`).
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
        }
    }
}

impl HttpTransportConfig {
    /// Create a new HTTP transport config with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Async HTTP transport shared by every in-flight request.
///
/// The only mutable piece is the session id, written by the handshake.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
    session_id: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Build a transport; no network traffic happens here.
    pub fn new(config: HttpTransportConfig) -> Result<Self> {
        url::Url::parse(&config.url)
            .map_err(|e| McpError::transport(format!("invalid MCP URL '{}': {}", config.url, e)))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| McpError::transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(url = %config.url, timeout = ?config.timeout, "created MCP HTTP transport");

        Ok(Self {
            client,
            config,
            session_id: RwLock::new(None),
        })
    }

    /// The configured endpoint URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Current session id, if the server assigned one.
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// Forget the session so the next handshake starts fresh.
    pub fn clear_session(&self) {
        *self.session_id.write() = None;
    }

    fn post(&self, body: String) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(&self.config.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json, text/event-stream")
            .body(body);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }
        if let Some(session) = self.session_id() {
            req = req.header(SESSION_HEADER, session);
        }
        req
    }

    /// Send a request and wait for its response.
    pub async fn send_request(&self, request: &JsonRpcRequest) -> Result<JsonRpcResponse> {
        let id = request
            .id
            .ok_or_else(|| McpError::protocol("request is missing an id"))?;
        let json = serde_json::to_string(request)?;

        tracing::trace!(url = %self.config.url, json = %json, "sending MCP HTTP request");

        let resp = self.post(json).send().await?;
        let status = resp.status();

        if let Some(session) = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut current = self.session_id.write();
            if current.as_deref() != Some(session) {
                *current = Some(session.to_string());
            }
        }

        if !status.is_success() {
            return Err(self.status_error(status, resp).await);
        }

        let is_sse = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));

        let body = resp.text().await?;

        tracing::trace!(json = %body, sse = is_sse, "received MCP HTTP response");

        if is_sse {
            parse_sse_response(&body, id)
        } else {
            Ok(serde_json::from_str(&body)?)
        }
    }

    /// Send a notification (no response expected).
    pub async fn send_notification(&self, notification: &JsonRpcRequest) -> Result<()> {
        let json = serde_json::to_string(notification)?;
        let resp = self.post(json).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.status_error(status, resp).await);
        }
        Ok(())
    }

    /// End the session on the server. Best effort.
    pub async fn terminate(&self) {
        let Some(session) = self.session_id() else {
            return;
        };
        let result = self
            .client
            .delete(&self.config.url)
            .header(SESSION_HEADER, &session)
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!(error = %e, "MCP session termination failed");
        }
        self.clear_session();
    }

    async fn status_error(&self, status: StatusCode, resp: reqwest::Response) -> McpError {
        if status == StatusCode::NOT_FOUND && self.session_id().is_some() {
            return McpError::SessionExpired;
        }
        let body = resp.text().await.unwrap_or_default();
        McpError::transport(format!("HTTP error {}: {}", status, body))
    }
}

/// Pick the JSON-RPC response for `id` out of an SSE body.
///
/// Events are separated by blank lines; multiple `data:` lines in one event are
/// joined with newlines. Events that are not JSON-RPC responses are skipped.
pub fn parse_sse_response(body: &str, id: u64) -> Result<JsonRpcResponse> {
    let mut data = String::new();

    let check = |data: &mut String| -> Option<JsonRpcResponse> {
        if data.is_empty() {
            return None;
        }
        let parsed = serde_json::from_str::<JsonRpcResponse>(data).ok();
        data.clear();
        parsed.filter(|r| r.answers(id) || r.is_orphan_error())
    };

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if let Some(resp) = check(&mut data) {
                return Ok(resp);
            }
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    check(&mut data).ok_or_else(|| {
        McpError::protocol(format!("no response for request {} in event stream", id))
    })
}
