//! Passthrough endpoints that invoke a tool without synthesis or grounding.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::envelope::Envelope;
use crate::error::{PipelineError, Result};
use crate::normalize::{extract_table, normalize};
use crate::state::AppState;

/// Body of `POST /mcp`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default)]
    pub params: Option<ToolCallParams>,
}

/// Tool name and arguments, forwarded unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Upsert a CRM record: the whole body goes to the upsert tool as `{record}`.
pub async fn sync_record_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let Json(record) = body?;
    let tool = &state.pipeline.tools().upsert;
    info!(tool = %tool, "Syncing record");

    let result = state
        .pipeline
        .passthrough(tool, json!({ "record": record }))
        .await?;
    Ok(Json(
        Envelope::success()
            .with_message("Record synced to graph")
            .with_result(normalize(&result)),
    ))
}

/// Generic tool call.
pub async fn tool_call_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<ToolCallRequest>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let Json(request) = body?;
    let params = request.params.unwrap_or_default();
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| PipelineError::bad_request("params.name is required"))?;
    let arguments = params.arguments.unwrap_or_else(|| json!({}));

    let result = state.pipeline.passthrough(&name, arguments).await?;
    Ok(Json(
        Envelope::success()
            .with_tool(name)
            .with_result(normalize(&result))
            .with_table(extract_table(&result)),
    ))
}

/// Create the graph schema and indexes.
pub async fn schema_build_handler(State(state): State<AppState>) -> Result<Json<Envelope>> {
    let tool = &state.pipeline.tools().schema;
    info!(tool = %tool, "Building schema");
    let result = state.pipeline.passthrough(tool, json!({})).await?;
    Ok(Json(Envelope::success().with_result(normalize(&result))))
}

/// Build the knowledge graph from source documents.
pub async fn kg_build_handler(State(state): State<AppState>) -> Result<Json<Envelope>> {
    let tool = &state.pipeline.tools().kg;
    info!(tool = %tool, "Building knowledge graph");
    let result = state.pipeline.passthrough(tool, json!({})).await?;
    Ok(Json(Envelope::success().with_result(normalize(&result))))
}

/// List the peer's tools.
pub async fn list_tools_handler(State(state): State<AppState>) -> Result<Json<Envelope>> {
    let tools = state.invoker().list_tools().await?;
    let listing: Vec<Value> = tools
        .into_iter()
        .map(|t| json!({ "name": t.name, "description": t.description }))
        .collect();
    Ok(Json(Envelope::success().with_result(listing)))
}

/// Re-run the MCP handshake after a connection failure.
pub async fn reconnect_handler(State(state): State<AppState>) -> Result<Json<Envelope>> {
    state.invoker().reconnect().await?;
    info!("Reconnected to MCP server");
    Ok(Json(Envelope::success().with_message("Reconnected to MCP server")))
}
