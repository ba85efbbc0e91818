//! Error types for the server.
//!
//! [`PipelineError`] is the failure taxonomy of the orchestration pipeline;
//! [`ServerError`] is the only type that becomes an HTTP response.

use std::fmt::Display;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use graphgate_mcp::McpError;
use thiserror::Error;

use crate::envelope::Envelope;
use crate::normalize::GraphData;

/// A failed pipeline step.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller sent something unusable.
    #[error("{0}")]
    BadRequest(String),

    /// Query synthesis failed or produced nothing.
    #[error("query synthesis failed: {0}")]
    Synthesis(String),

    /// The tool peer could not be reached, rejected the call, or timed out.
    #[error("{0}")]
    ToolInvocation(#[from] McpError),

    /// Answer synthesis failed or produced nothing.
    #[error("answer grounding failed: {0}")]
    Grounding(String),
}

impl PipelineError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn synthesis(cause: impl Display) -> Self {
        Self::Synthesis(cause.to_string())
    }

    pub fn grounding(cause: impl Display) -> Self {
        Self::Grounding(cause.to_string())
    }

    /// The underlying message reported as `error`; `kind` names the step.
    pub fn cause(&self) -> String {
        match self {
            PipelineError::BadRequest(msg)
            | PipelineError::Synthesis(msg)
            | PipelineError::Grounding(msg) => msg.clone(),
            PipelineError::ToolInvocation(e) => e.cause(),
        }
    }

    /// Stable tag reported as `kind` in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::BadRequest(_) => "bad_request",
            PipelineError::Synthesis(_) => "synthesis_failure",
            PipelineError::ToolInvocation(_) => "tool_invocation_failure",
            PipelineError::Grounding(_) => "grounding_failure",
        }
    }

    /// 400 for caller faults (including unknown tools and bad tool
    /// arguments), 500 for everything else.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::ToolInvocation(e) if e.is_caller_fault() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A pipeline step failed with nothing worth returning.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Grounding failed after the query ran; the query and data are kept.
    #[error("{error}")]
    Partial {
        error: PipelineError,
        cypher: String,
        result: GraphData,
    },

    /// Invalid server configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<McpError> for ServerError {
    fn from(e: McpError) -> Self {
        ServerError::Pipeline(PipelineError::ToolInvocation(e))
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::Pipeline(PipelineError::BadRequest(rejection.body_text()))
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

impl ServerError {
    fn cause(&self) -> String {
        match self {
            ServerError::Pipeline(e) | ServerError::Partial { error: e, .. } => e.cause(),
            ServerError::Config(msg) | ServerError::Internal(msg) => msg.clone(),
        }
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Pipeline(e) => (e.status(), e.kind()),
            ServerError::Partial { error, .. } => (error.status(), error.kind()),
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let message = self.cause();

        if status.is_server_error() {
            tracing::error!(status = %status, kind, error = %self, "Request failed");
        } else {
            tracing::warn!(status = %status, kind, error = %self, "Request rejected");
        }

        let body = match self {
            ServerError::Partial { cypher, result, .. } => {
                Envelope::failure(message, kind).with_partial(cypher, result)
            }
            _ => Envelope::failure(message, kind),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphgate_mcp::protocol::JsonRpcError;

    #[test]
    fn test_kinds_and_status() {
        let cases = [
            (PipelineError::bad_request("x"), StatusCode::BAD_REQUEST, "bad_request"),
            (PipelineError::synthesis("x"), StatusCode::INTERNAL_SERVER_ERROR, "synthesis_failure"),
            (
                McpError::transport("reset").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "tool_invocation_failure",
            ),
            (PipelineError::grounding("x"), StatusCode::INTERNAL_SERVER_ERROR, "grounding_failure"),
        ];
        for (err, status, kind) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn test_unknown_tool_is_caller_fault() {
        let err: PipelineError =
            McpError::server_error(JsonRpcError::METHOD_NOT_FOUND, "Unknown tool: nope", None).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "tool_invocation_failure");
    }

    #[test]
    fn test_error_message_is_underlying_cause() {
        let err: PipelineError = McpError::transport("connection reset by peer").into();
        assert_eq!(err.cause(), "connection reset by peer");
        assert_eq!(PipelineError::synthesis("model returned an empty query").cause(), "model returned an empty query");
        assert_eq!(PipelineError::grounding("rate limited").cause(), "rate limited");
    }

    #[tokio::test]
    async fn test_error_response_envelope() {
        let response = ServerError::from(McpError::transport("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["kind"], "tool_invocation_failure");
        assert_eq!(json["error"], "boom");
        assert!(json.get("cypher").is_none());
        assert!(json.get("partial").is_none());
    }

    #[tokio::test]
    async fn test_partial_response_keeps_query_and_data() {
        let response = ServerError::Partial {
            error: PipelineError::grounding("llm down"),
            cypher: "MATCH (n) RETURN n".to_string(),
            result: GraphData::Value(serde_json::json!([1])),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["partial"], true);
        assert_eq!(json["error"], "llm down");
        assert_eq!(json["kind"], "grounding_failure");
        assert_eq!(json["cypher"], "MATCH (n) RETURN n");
        assert_eq!(json["result"], serde_json::json!([1]));
    }
}
