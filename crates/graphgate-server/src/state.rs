//! Application state shared across handlers.

use std::sync::Arc;

use graphgate_llm::SharedBackend;
use graphgate_mcp::SharedInvoker;

use crate::config::ServerConfig;
use crate::pipeline::Pipeline;

/// Application state shared across all handlers.
///
/// The tool invoker is created once at startup and injected here; handlers
/// only ever call through it.
#[derive(Clone)]
pub struct AppState {
    /// The orchestration pipeline.
    pub pipeline: Arc<Pipeline>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(invoker: SharedInvoker, llm: SharedBackend, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(Pipeline::new(invoker, llm, &config)),
            config: Arc::new(config),
        }
    }

    /// The shared tool invoker.
    pub fn invoker(&self) -> &SharedInvoker {
        self.pipeline.invoker()
    }
}
