//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use graphgate_config::{DEFAULT_MODEL, DEFAULT_PORT, DEFAULT_SCHEMA_HINT, GatewayConfig, ToolsConfig};

use crate::error::{Result, ServerError};

/// Default completion length for both synthesis steps.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// Model used for query and answer synthesis.
    pub model: String,

    /// Completion length cap.
    pub max_tokens: u32,

    /// Peer tool names used by each mode.
    pub tools: ToolsConfig,

    /// Graph description embedded in query prompts.
    pub schema_hint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            request_logging: true,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            tools: ToolsConfig::default(),
            schema_hint: DEFAULT_SCHEMA_HINT.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a loaded gateway configuration.
    pub fn from_gateway(config: &GatewayConfig) -> Result<Self> {
        let server = config.server();
        let llm = config.llm();
        let ip: IpAddr = server.bind.parse().map_err(|e| {
            ServerError::Config(format!("invalid bind address '{}': {}", server.bind, e))
        })?;

        Ok(Self {
            bind_address: SocketAddr::new(ip, server.port),
            request_logging: server.request_logging,
            model: llm.model,
            max_tokens: llm.max_tokens,
            tools: config.tools(),
            schema_hint: config.graph().schema_hint,
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the tool names.
    pub fn with_tools(mut self, tools: ToolsConfig) -> Self {
        self.tools = tools;
        self
    }

    /// Set the schema hint.
    pub fn with_schema_hint(mut self, hint: impl Into<String>) -> Self {
        self.schema_hint = hint.into();
        self
    }
}
