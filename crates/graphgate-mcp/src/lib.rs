//! MCP (Model Context Protocol) tool-call client for graphgate.
//!
//! The gateway holds exactly one connection to its graph tool server. This
//! crate provides that connection and the [`ToolInvoker`] seam the HTTP layer
//! depends on.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  McpClient  (impl ToolInvoker)                              │
//! │  - initialize + notifications/initialized on connect        │
//! │  - tools/list, tools/call                                   │
//! │  - fails fast after a connection-level error                │
//! └─────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  HttpTransport                                              │
//! │  - JSON-RPC 2.0 over streamable HTTP (JSON or SSE replies)  │
//! │  - Mcp-Session-Id tracking, per-request timeout             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use graphgate_mcp::{McpClient, McpServerConfig, ToolInvoker};
//!
//! let config = McpServerConfig::http("graph", "http://localhost:8005/mcp");
//! let client = McpClient::connect(config).await?;
//!
//! let result = client
//!     .invoke("read_neo4j_cypher", json!({"query": "MATCH (n) RETURN n LIMIT 5"}))
//!     .await?;
//! ```

pub mod client;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod protocol;
pub mod result;
pub mod transport;

pub use client::{McpClient, McpServerConfig, SharedInvoker, ToolInvoker};
pub use error::{McpError, Result};
#[cfg(any(test, feature = "testing"))]
pub use mock::MockInvoker;
pub use protocol::{Implementation, JsonRpcError, ToolInfo};
pub use result::{Block, ToolResult};
pub use transport::{HttpTransport, HttpTransportConfig};
