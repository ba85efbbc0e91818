//! CLI command handlers.

pub mod call;
pub mod config;
pub mod start;
pub mod tools;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use graphgate_config::{LoadedConfig, McpConfig};
use graphgate_mcp::{McpClient, McpServerConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load configuration from an explicit file, or by discovery.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match explicit {
        Some(path) => graphgate_config::load_explicit(path)?,
        None => graphgate_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        tracing::warn!(%warning, "config warning");
    }
    Ok(loaded)
}

/// Connect to the configured MCP server, failing if the handshake does.
pub async fn connect_mcp(mcp: &McpConfig) -> Result<McpClient> {
    let mut server = McpServerConfig::http("graph", &mcp.url)
        .with_timeout(Duration::from_secs(mcp.timeout_secs));
    for [name, value] in &mcp.headers {
        server = server.with_header(name, value);
    }

    McpClient::connect(server)
        .await
        .with_context(|| format!("failed to connect to MCP server at {}", mcp.url))
}
