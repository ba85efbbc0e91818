//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Service identity.
    pub service: String,
    /// Service version.
    pub version: String,
    /// `"connected"` or `"broken"`.
    pub mcp: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let mcp = if state.invoker().is_connected() {
        "connected"
    } else {
        "broken"
    };
    Json(HealthResponse {
        ok: true,
        service: "graphgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mcp: mcp.to_string(),
    })
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
