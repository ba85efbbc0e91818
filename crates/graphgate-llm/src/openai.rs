//! Chat-completions client for OpenAI and compatible servers.
//!
//! Anything that serves `POST {base}/chat/completions` works: OpenAI itself,
//! Ollama, vLLM, LM Studio. Local servers usually need no key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::backend::LlmBackend;
use crate::error::{LlmError, Result};
use crate::types::{CompletionRequest, CompletionResponse, Role, StopReason, Usage};

pub const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and how to reach the model.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Pins the model, ignoring whatever each request asks for.
    pub model: Option<String>,
    pub timeout: Duration,
    /// Label used in logs.
    pub name: String,
}

impl OpenAiConfig {
    /// The hosted OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::local(DEFAULT_OPENAI_BASE).with_name("openai")
        }
    }

    /// A keyless server at `base_url`.
    pub fn local(base_url: impl Into<String>) -> Self {
        Self {
            api_key: None,
            base_url: base_url.into(),
            model: None,
            timeout: DEFAULT_TIMEOUT,
            name: "local".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`LlmBackend`] over the chat-completions endpoint.
pub struct OpenAiBackend {
    http: Client,
    endpoint: String,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("cannot build HTTP client: {}", e)))?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    fn chat_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatBody<'a> {
        let system = request.system.as_deref().map(|content| ChatTurn {
            role: "system",
            content,
        });
        let turns = request.messages.iter().map(|m| ChatTurn {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        });

        ChatBody {
            model: self.config.model.as_deref().unwrap_or(&request.model),
            messages: system.into_iter().chain(turns).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

/// Map a non-2xx reply onto an error, preferring the provider's own message.
fn status_error(status: StatusCode, body: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimit(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => LlmError::InvalidRequest(message),
        _ => LlmError::Backend(message),
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.chat_body(&request);
        tracing::debug!(
            backend = %self.config.name,
            model = %body.model,
            turns = body.messages.len(),
            temperature = ?body.temperature,
            "requesting chat completion"
        );

        let mut call = self
            .http
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body);
        if let Some(key) = &self.config.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let reply: ChatReply = serde_json::from_str(&text)?;
        Ok(reply.into())
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<ChatReply> for CompletionResponse {
    fn from(reply: ChatReply) -> Self {
        let choice = reply.choices.into_iter().next();
        let stop_reason = match choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
            Some("length") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };
        let content = choice
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = reply
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        CompletionResponse::new(reply.id, reply.model, content, stop_reason, usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;
    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    fn ask() -> CompletionRequest {
        CompletionRequest::new("m", vec![Message::user("hi")], 8)
    }

    #[test]
    fn test_openai_preset() {
        let config = OpenAiConfig::openai("test-key");
        assert_eq!(config.api_key.as_deref(), Some("test-key"));
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE);
        assert_eq!(config.name, "openai");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_endpoint_ignores_trailing_slash() {
        let backend =
            OpenAiBackend::new(OpenAiConfig::openai("key").with_base_url("http://custom.api/v1/"))
                .unwrap();
        assert_eq!(backend.endpoint, "http://custom.api/v1/chat/completions");
    }

    #[test]
    fn test_body_puts_system_first_and_pins_model() {
        let backend =
            OpenAiBackend::new(OpenAiConfig::openai("key").with_model("gpt-4o-mini")).unwrap();
        let request = CompletionRequest::new("ignored", vec![Message::user("question")], 64)
            .with_system("system prompt")
            .with_temperature(0.0);

        let json = serde_json::to_value(backend.chat_body(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0], json!({"role": "system", "content": "system prompt"}));
        assert_eq!(json["messages"][1]["content"], "question");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_reply_conversion() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "MATCH (n) RETURN n"}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 5}
        }"#;
        let resp: CompletionResponse = serde_json::from_str::<ChatReply>(raw).unwrap().into();
        assert_eq!(resp.text(), "MATCH (n) RETURN n");
        assert_eq!(resp.stop_reason, Some(StopReason::MaxTokens));
        assert_eq!(resp.usage, Usage::new(12, 5));
    }

    #[test]
    fn test_reply_without_choices_is_empty_text() {
        let resp: CompletionResponse = serde_json::from_str::<ChatReply>(r#"{"choices": []}"#)
            .unwrap()
            .into();
        assert_eq!(resp.text(), "");
    }

    #[test]
    fn test_status_error_mapping() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, body),
            LlmError::Auth(ref m) if m == "bad key"
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, body),
            LlmError::RateLimit(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "upstream down"),
            LlmError::Backend(ref m) if m.contains("upstream down")
        ));
    }

    async fn serve(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_complete_against_local_server() {
        let base = serve(
            StatusCode::OK,
            json!({
                "id": "c1",
                "model": "local-model",
                "choices": [{"message": {"content": "hello"}, "finish_reason": "stop"}]
            }),
        )
        .await;

        let backend = OpenAiBackend::new(OpenAiConfig::local(base)).unwrap();
        let resp = backend.complete(ask()).await.unwrap();
        assert_eq!(resp.text(), "hello");
        assert_eq!(resp.model, "local-model");
    }

    #[tokio::test]
    async fn test_http_error_is_mapped() {
        let base = serve(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "bad key"}}),
        )
        .await;
        let backend = OpenAiBackend::new(OpenAiConfig::local(base)).unwrap();
        let err = backend.complete(ask()).await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(ref m) if m.contains("bad key")));
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let backend = OpenAiBackend::new(
            OpenAiConfig::local("http://127.0.0.1:9/v1").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let err = backend.complete(ask()).await.unwrap_err();
        assert!(matches!(err, LlmError::Network(_)));
    }
}
