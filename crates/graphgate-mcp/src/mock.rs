//! Scripted [`ToolInvoker`] for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::client::ToolInvoker;
use crate::error::{McpError, Result};
use crate::protocol::ToolInfo;
use crate::result::{ToolResult, is_error_result};

/// A mock invoker that replays queued results per tool name.
///
/// Raw results go through the same classification as the real client, so an
/// `isError: true` payload still comes back as [`McpError::ToolError`].
#[derive(Debug, Default)]
pub struct MockInvoker {
    replies: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    tools: Vec<ToolInfo>,
    calls: Mutex<Vec<(String, Value)>>,
    disconnected: AtomicBool,
}

impl MockInvoker {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw result for `tool`.
    pub fn with_result(self, tool: impl Into<String>, raw: Value) -> Self {
        self.push(tool.into(), Ok(raw));
        self
    }

    /// Queue a failure for `tool`.
    pub fn with_error(self, tool: impl Into<String>, err: McpError) -> Self {
        self.push(tool.into(), Err(err));
        self
    }

    /// Tools reported by `list_tools`.
    pub fn with_tools(mut self, tools: Vec<ToolInfo>) -> Self {
        self.tools = tools;
        self
    }

    fn push(&self, tool: String, reply: Result<Value>) {
        self.replies.lock().entry(tool).or_default().push_back(reply);
    }

    /// Simulate the connection going down (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Every `(tool, arguments)` pair invoked so far.
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Get the number of invocations made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ToolInvoker for MockInvoker {
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        self.calls.lock().push((name.to_string(), arguments));

        if self.disconnected.load(Ordering::SeqCst) {
            return Err(McpError::ConnectionBroken("mock peer disconnected".to_string()));
        }

        let reply = self
            .replies
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(McpError::server_error(
                    crate::protocol::JsonRpcError::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", name),
                    None,
                ))
            })?;

        if is_error_result(&reply) {
            return Err(McpError::tool_error(ToolResult::from_value(reply).text()));
        }
        Ok(ToolResult::from_value(reply))
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(McpError::ConnectionBroken("mock peer disconnected".to_string()));
        }
        Ok(self.tools.clone())
    }

    async fn reconnect(&self) -> Result<()> {
        self.set_connected(true);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }
}
