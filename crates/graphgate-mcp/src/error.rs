//! Errors raised by the MCP client.

use thiserror::Error;

use crate::protocol::JsonRpcError;

pub type Result<T> = std::result::Result<T, McpError>;

/// Everything that can go wrong between the gateway and its tool server.
///
/// Variants split into connection faults, which poison the client until it
/// reconnects, and request faults, which only fail the call at hand. See
/// [`McpError::is_connection_fault`].
#[derive(Debug, Error)]
pub enum McpError {
    #[error("tool server unreachable: {0}")]
    Connect(String),

    #[error("tool server transport failed: {0}")]
    Transport(String),

    /// The peer sent something that is not valid MCP.
    #[error("malformed MCP exchange: {0}")]
    Protocol(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON-RPC `error` object came back instead of a result.
    #[error("tool server rejected call ({code}): {message}")]
    ServerError {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The tool ran and reported failure (`isError`, or `ok: false`).
    #[error("tool reported failure: {0}")]
    ToolError(String),

    #[error("MCP handshake has not completed")]
    NotInitialized,

    #[error("tool server expired the MCP session")]
    SessionExpired,

    #[error("tool server connection is broken: {0}")]
    ConnectionBroken(String),

    #[error("tool server did not answer in time")]
    Timeout,
}

impl McpError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn tool_error(msg: impl Into<String>) -> Self {
        Self::ToolError(msg.into())
    }

    /// The peer's or transport's own message, without the variant prefix.
    pub fn cause(&self) -> String {
        match self {
            Self::Connect(msg)
            | Self::Transport(msg)
            | Self::Protocol(msg)
            | Self::ToolError(msg)
            | Self::ConnectionBroken(msg) => msg.clone(),
            Self::ServerError { message, .. } => message.clone(),
            Self::Json(e) => e.to_string(),
            Self::NotInitialized | Self::SessionExpired | Self::Timeout => self.to_string(),
        }
    }

    /// Whether the connection itself is gone rather than just this call.
    pub fn is_connection_fault(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::SessionExpired | Self::ConnectionBroken(_)
        )
    }

    /// Whether the peer blamed the arguments or tool name we sent.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::ServerError { code, .. }
                if *code == JsonRpcError::METHOD_NOT_FOUND || *code == JsonRpcError::INVALID_PARAMS
        )
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            McpError::Timeout
        } else if err.is_connect() {
            McpError::Connect(err.to_string())
        } else {
            McpError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = McpError::transport("connection reset by peer");
        assert_eq!(
            err.to_string(),
            "tool server transport failed: connection reset by peer"
        );

        let err = McpError::server_error(-32602, "unknown argument", None);
        assert!(err.to_string().contains("(-32602)"));
        assert!(err.to_string().contains("unknown argument"));
    }

    #[test]
    fn test_cause_drops_prefix() {
        assert_eq!(McpError::transport("connection reset by peer").cause(), "connection reset by peer");
        assert_eq!(McpError::server_error(-32601, "Unknown tool: x", None).cause(), "Unknown tool: x");
        assert_eq!(McpError::Timeout.cause(), "tool server did not answer in time");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let mcp_err: McpError = json_err.into();
        assert!(matches!(mcp_err, McpError::Json(_)));
    }

    #[test]
    fn test_connection_fault_classification() {
        assert!(McpError::Connect("refused".into()).is_connection_fault());
        assert!(McpError::SessionExpired.is_connection_fault());
        assert!(!McpError::Timeout.is_connection_fault());
        assert!(!McpError::tool_error("boom").is_connection_fault());
        assert!(!McpError::server_error(-32603, "oops", None).is_connection_fault());
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(McpError::server_error(JsonRpcError::METHOD_NOT_FOUND, "no", None).is_caller_fault());
        assert!(McpError::server_error(JsonRpcError::INVALID_PARAMS, "bad", None).is_caller_fault());
        assert!(!McpError::server_error(-32603, "x", None).is_caller_fault());
        assert!(!McpError::Timeout.is_caller_fault());
    }
}
