//! Failures talking to a text-generation provider.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider answered, but with an error or an unusable reply.
    #[error("model provider error: {0}")]
    Backend(String),

    /// The provider could not be reached, or did not answer in time.
    #[error("model provider unreachable: {0}")]
    Network(String),

    #[error("model reply could not be decoded: {0}")]
    Serialization(String),

    #[error("model provider rejected the request: {0}")]
    InvalidRequest(String),

    #[error("model provider is rate limiting: {0}")]
    RateLimit(String),

    #[error("model provider refused credentials: {0}")]
    Auth(String),

    #[error("{0}")]
    Internal(String),
}

impl LlmError {
    /// Whether trying again later could succeed. Nothing here retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let what = if err.is_timeout() {
            "timed out"
        } else if err.is_connect() {
            "connect failed"
        } else {
            "request failed"
        };
        LlmError::Network(format!("{}: {}", what, err))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
