//! Backend trait and the test double.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
#[cfg(any(test, feature = "testing"))]
use crate::{
    error::LlmError,
    types::{StopReason, Usage},
};
use crate::types::{CompletionRequest, CompletionResponse};

/// A text-generation provider.
///
/// Implementations own their HTTP client and enforce their own request
/// timeout. They must not retry on their own.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Execute a completion request and return the full response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Label used in logs.
    fn name(&self) -> &str;
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// A mock backend for testing purposes.
///
/// Returns pre-configured outcomes in order and records every request. Once
/// the script runs out, further calls fail with a backend error.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct MockBackend {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<CompletionResponse>>>,
    request_log: parking_lot::Mutex<Vec<CompletionRequest>>,
}

#[cfg(any(test, feature = "testing"))]
impl MockBackend {
    /// Create a new mock backend with the given responses.
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into_iter().map(Ok).collect()),
            request_log: parking_lot::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::default().then_text(text)
    }

    /// Create a mock backend that replies with each text in turn.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .fold(Self::default(), |mock, text| mock.then_text(text))
    }

    /// Queue another text response.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        let n = self.responses.lock().len() + 1;
        self.responses.lock().push_back(Ok(CompletionResponse::new(
            format!("mock_msg_{}", n),
            "mock-model",
            text,
            StopReason::EndTurn,
            Usage::new(10, 20),
        )));
        self
    }

    /// Queue a failure.
    pub fn then_error(self, err: LlmError) -> Self {
        self.responses.lock().push_back(Err(err));
        self
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }
}

#[cfg(any(test, feature = "testing"))]
#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.request_log.lock().push(request);

        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            ))
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
