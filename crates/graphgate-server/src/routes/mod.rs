//! API routes.

pub mod health;
pub mod modes;
pub mod tools;

pub use health::{HealthResponse, health_routes};
pub use modes::{QuestionRequest, method1_handler, method2_handler, no_rag_handler};
pub use tools::{
    ToolCallParams, ToolCallRequest, kg_build_handler, list_tools_handler, reconnect_handler,
    schema_build_handler, sync_record_handler, tool_call_handler,
};
