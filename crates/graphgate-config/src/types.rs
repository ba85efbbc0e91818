//! Configuration types.

use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default MCP endpoint.
pub const DEFAULT_MCP_URL: &str = "http://localhost:8005/mcp";

/// Default text-generation base URL.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default env var holding the model API key.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Schema description embedded in the query-synthesis prompt.
pub const DEFAULT_SCHEMA_HINT: &str = "\
Node labels:
- Document {path, title}
- Chunk {text, index, embedding}
- Entity {name, type}
- Supplier {name, location, rating}
- Component {name, part_number, category}
- Product {name, sku, line}
Relationships:
- (:Document)-[:HAS_CHUNK]->(:Chunk)
- (:Chunk)-[:HAS_ENTITY]->(:Entity)
- (:Supplier)-[:CAN_SUPPLY]->(:Component)
- (:Component)-[:USED_IN]->(:Product)
- (:Supplier)-[:SUPPLIES]->(:Product)
- (:Chunk)-[:MENTIONS]->(:Entity)
- (:Entity)-[:REFERS_TO]->(:Supplier|Component|Product)
- (:Chunk)-[:LINKS_TO]->(:Chunk)";

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged; accessors fill in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener.
    pub server: Option<ServerConfig>,
    /// Text-generation service.
    pub llm: Option<LlmConfig>,
    /// Remote tool peer.
    pub mcp: Option<McpConfig>,
    /// Tool names used by the fixed pipeline modes.
    pub tools: Option<ToolsConfig>,
    /// Graph description for prompts.
    pub graph: Option<GraphConfig>,
}

impl GatewayConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections replace wholesale; fields inside a section are not merged.
    pub fn merge(&mut self, other: GatewayConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.llm.is_some() {
            self.llm = other.llm;
        }
        if other.mcp.is_some() {
            self.mcp = other.mcp;
        }
        if other.tools.is_some() {
            self.tools = other.tools;
        }
        if other.graph.is_some() {
            self.graph = other.graph;
        }
    }

    /// Server section, defaulted.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// LLM section, defaulted.
    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    /// MCP section, defaulted.
    pub fn mcp(&self) -> McpConfig {
        self.mcp.clone().unwrap_or_default()
    }

    /// Tools section, defaulted.
    pub fn tools(&self) -> ToolsConfig {
        self.tools.clone().unwrap_or_default()
    }

    /// Graph section, defaulted.
    pub fn graph(&self) -> GraphConfig {
        self.graph.clone().unwrap_or_default()
    }

    /// Fill every missing section with its defaults (for display).
    pub fn resolved(&self) -> Self {
        Self {
            server: Some(self.server()),
            llm: Some(self.llm()),
            mcp: Some(self.mcp()),
            tools: Some(self.tools()),
            graph: Some(self.graph()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            request_logging: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Text-generation service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key stored in the file. Prefer `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Completion length cap.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 60,
            max_tokens: 1024,
        }
    }
}

impl LlmConfig {
    /// Returns true if an API key is stored directly in the config file.
    pub fn has_plaintext_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Resolve the API key: environment first, then the file.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }

    /// Resolve the API key, failing when the hosted default endpoint is used
    /// without one. Self-hosted endpoints may run keyless.
    pub fn require_api_key(&self) -> crate::Result<Option<String>> {
        match self.resolve_api_key() {
            Some(key) => Ok(Some(key)),
            None if self.base_url == DEFAULT_LLM_BASE_URL => Err(crate::ConfigError::MissingField {
                field: format!("api_key (or ${})", self.api_key_env),
                context: "[llm]".to_string(),
            }),
            None => Ok(None),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MCP Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Remote tool peer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Streamable-HTTP endpoint.
    pub url: String,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
    /// Extra headers as `[name, value]` pairs.
    pub headers: Vec<[String; 2]>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MCP_URL.to_string(),
            timeout_secs: 30,
            headers: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools / Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Names of the peer tools each mode calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Executes a read-only Cypher query (`{query}`).
    pub read: String,
    /// Generates and runs Cypher from a question (`{query}`).
    pub text2cypher: String,
    /// Upserts a CRM record (`{record}`).
    pub upsert: String,
    /// Creates the graph schema and indexes.
    pub schema: String,
    /// Builds the knowledge graph from source documents.
    pub kg: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            read: "read_neo4j_cypher".to_string(),
            text2cypher: "text2cypher".to_string(),
            upsert: "sync_salesforce_record".to_string(),
            schema: "build_graph_schema".to_string(),
            kg: "build_kg_from_pdfs".to_string(),
        }
    }
}

/// Graph description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Labels and relationship types described to the query synthesizer.
    pub schema_hint: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            schema_hint: DEFAULT_SCHEMA_HINT.to_string(),
        }
    }
}
