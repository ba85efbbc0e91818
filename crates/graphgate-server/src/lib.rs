//! Orchestration pipeline and HTTP API for graphgate.
//!
//! A request flows one way:
//!
//! ```text
//! question ─► QuerySynthesizer ─► ToolInvoker ─► normalize ─► AnswerSynthesizer ─► Envelope
//!              (optional)                                      (optional)
//! ```
//!
//! Every endpoint answers with the same [`Envelope`]. Failures are converted
//! to envelopes in exactly one place, [`ServerError`]'s `IntoResponse`.
//!
//! # Example
//!
//! ```ignore
//! use graphgate_server::{Server, ServerConfig};
//!
//! let client = Arc::new(McpClient::connect(mcp_config).await?);
//! let llm = Arc::new(OpenAiBackend::new(OpenAiConfig::openai(api_key))?);
//!
//! Server::new(client, llm, ServerConfig::new()).run().await?;
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod synth;

pub use config::ServerConfig;
pub use envelope::Envelope;
pub use error::{PipelineError, Result, ServerError};
pub use logging::request_logging_middleware;
pub use normalize::{
    GraphData, Table, extract_table, normalize, reported_failure, structured_payload,
};
pub use pipeline::Pipeline;
pub use state::AppState;
pub use synth::{AnswerSynthesizer, QuerySynthesizer, strip_code_fences};

use std::future::Future;
use std::net::SocketAddr;

use axum::{Router, middleware};
use graphgate_llm::SharedBackend;
use graphgate_mcp::SharedInvoker;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The graphgate HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server around a connected invoker and a text-generation backend.
    pub fn new(invoker: SharedInvoker, llm: SharedBackend, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(invoker, llm, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::{get, post};

        Router::new()
            .merge(routes::health_routes())
            // Question-driven modes
            .route("/method1", post(routes::method1_handler))
            .route("/method2", post(routes::method2_handler))
            .route("/no-rag", post(routes::no_rag_handler))
            // Passthrough modes
            .route("/sync/sf", post(routes::sync_record_handler))
            .route("/mcp", post(routes::tool_call_handler))
            .route("/mcp/reconnect", post(routes::reconnect_handler))
            .route("/schema/build", post(routes::schema_build_handler))
            .route("/kg/build", post(routes::kg_build_handler))
            .route("/tools", get(routes::list_tools_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve on the configured address until the process is killed.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_with_shutdown(addr, std::future::pending()).await
    }

    /// Bind `addr` and serve until `shutdown` resolves.
    pub async fn run_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("cannot bind {}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener. In-flight requests are drained
    /// once `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!(addr = %local, "gateway listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("server loop failed: {}", e)))?;

        info!("gateway stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use graphgate_llm::{LlmError, MockBackend};
    use graphgate_mcp::{McpError, MockInvoker, ToolInvoker, protocol::JsonRpcError};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SUPPLIER_QUERY: &str = r#"MATCH (p:Product {name:"X"})<-[:SUPPLIES]-(s:Supplier) RETURN s"#;

    fn app(invoker: MockInvoker, llm: MockBackend) -> Router {
        let config = ServerConfig::new().with_request_logging(false);
        Server::new(Arc::new(invoker), Arc::new(llm), config).router()
    }

    async fn post(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_no_rag_end_to_end() {
        let invoker = MockInvoker::new().with_result(
            "read_neo4j_cypher",
            json!({"content": {"text": "[{\"s\":{\"name\":\"Acme\"}}]"}}),
        );
        let llm = MockBackend::with_text(SUPPLIER_QUERY);

        let (status, body) = post(
            app(invoker, llm),
            "/no-rag",
            json!({"naturalLanguage": "list all suppliers for product X"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["mode"], "no-rag");
        assert_eq!(body["cypher"], SUPPLIER_QUERY);
        assert_eq!(body["result"], "[{\"s\":{\"name\":\"Acme\"}}]");
        assert_eq!(body["table"]["columns"], json!(["s"]));
        assert!(body.get("error").is_none());
        assert!(body.get("groundedAnswer").is_none());
    }

    #[tokio::test]
    async fn test_method1_success() {
        let invoker = MockInvoker::new().with_result("read_neo4j_cypher", json!([{"s": "Acme"}]));
        let llm = MockBackend::with_texts([format!("```cypher\n{SUPPLIER_QUERY}\n```"), "Acme.".to_string()]);

        let (status, body) = post(app(invoker, llm), "/method1", json!({"naturalLanguage": "who?"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "method1");
        assert_eq!(body["cypher"], SUPPLIER_QUERY);
        assert_eq!(body["groundedAnswer"], "Acme.");
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_method1_grounding_failure_is_partial() {
        let invoker = MockInvoker::new().with_result("read_neo4j_cypher", json!([{"s": "Acme"}]));
        let llm = MockBackend::with_text(SUPPLIER_QUERY).then_error(LlmError::Network("timeout".into()));

        let (status, body) = post(app(invoker, llm), "/method1", json!({"naturalLanguage": "who?"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
        assert_eq!(body["partial"], true);
        assert_eq!(body["kind"], "grounding_failure");
        assert_eq!(body["cypher"], SUPPLIER_QUERY);
        assert_eq!(body["result"], json!([{"s": "Acme"}]));
    }

    #[tokio::test]
    async fn test_method2_success() {
        let invoker = MockInvoker::new().with_result(
            "text2cypher",
            json!({"structuredContent": {"cypher": "MATCH (n) RETURN n", "data": [1]}}),
        );
        let llm = MockBackend::with_text("One node.");

        let (status, body) = post(app(invoker, llm), "/method2", json!({"naturalLanguage": "what?"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "method2");
        assert_eq!(body["cypher"], "MATCH (n) RETURN n");
        assert_eq!(body["groundedAnswer"], "One node.");
    }

    #[tokio::test]
    async fn test_transport_error_is_500_with_message() {
        let invoker = MockInvoker::new()
            .with_error("read_neo4j_cypher", McpError::transport("connection reset by peer"));
        let llm = MockBackend::with_text(SUPPLIER_QUERY);

        let (status, body) = post(app(invoker, llm), "/no-rag", json!({"naturalLanguage": "q"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
        assert_eq!(body["kind"], "tool_invocation_failure");
        assert_eq!(body["error"], "connection reset by peer");
        assert!(body.get("cypher").is_none());
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_500() {
        let llm = MockBackend::default().then_error(LlmError::Auth("invalid key".into()));
        let (status, body) = post(app(MockInvoker::new(), llm), "/method1", json!({"naturalLanguage": "q"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "synthesis_failure");
        assert!(body.get("partial").is_none());
    }

    #[tokio::test]
    async fn test_bad_requests_are_400() {
        let (status, body) = post(app(MockInvoker::new(), MockBackend::default()), "/no-rag", json!({"naturalLanguage": "  "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "bad_request");

        let (status, _) = post(app(MockInvoker::new(), MockBackend::default()), "/method1", json!({"question": "q"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(app(MockInvoker::new(), MockBackend::default()), "/mcp", json!({"params": {}})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "params.name is required");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_400() {
        let invoker = MockInvoker::new().with_error(
            "nope",
            McpError::server_error(JsonRpcError::METHOD_NOT_FOUND, "Unknown tool: nope", None),
        );
        let (status, body) = post(app(invoker, MockBackend::default()), "/mcp", json!({"params": {"name": "nope"}})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "tool_invocation_failure");
    }

    #[tokio::test]
    async fn test_mcp_passthrough_forwards_unchanged() {
        let invoker = Arc::new(MockInvoker::new().with_result(
            "custom_tool",
            json!({"content": [{"type": "text", "text": "{\"records\": [{\"id\": 1}]}"}]}),
        ));
        let router = Server::new(invoker.clone(), Arc::new(MockBackend::default()), ServerConfig::new()).router();

        let (status, body) = post(
            router,
            "/mcp",
            json!({"params": {"name": "custom_tool", "arguments": {"limit": 3}}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tool"], "custom_tool");
        assert_eq!(body["result"], json!([{"id": 1}]));
        assert_eq!(body["table"]["columns"], json!(["id"]));
        assert_eq!(invoker.calls()[0].1, json!({"limit": 3}));
    }

    #[tokio::test]
    async fn test_sync_wraps_record() {
        let invoker = Arc::new(MockInvoker::new().with_result(
            "sync_salesforce_record",
            json!({"structuredContent": {"ok": true, "id": "001"}}),
        ));
        let router = Server::new(invoker.clone(), Arc::new(MockBackend::default()), ServerConfig::new()).router();

        let (status, body) = post(router, "/sync/sf", json!({"Id": "001", "Name": "Acme"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Record synced to graph");
        assert_eq!(invoker.calls()[0].1, json!({"record": {"Id": "001", "Name": "Acme"}}));
    }

    #[tokio::test]
    async fn test_build_endpoints() {
        let invoker = MockInvoker::new()
            .with_result("build_graph_schema", json!("Schema created"))
            .with_result("build_kg_from_pdfs", json!({"structuredContent": {"ok": true, "documents": 4}}));
        let router = app(invoker, MockBackend::default());

        let (status, body) = post(router.clone(), "/schema/build", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "Schema created");

        let (status, body) = post(router, "/kg/build", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["documents"], 4);
    }

    #[tokio::test]
    async fn test_reconnect_restores_connection() {
        let invoker = Arc::new(MockInvoker::new());
        invoker.set_connected(false);
        let router = Server::new(invoker.clone(), Arc::new(MockBackend::default()), ServerConfig::new()).router();

        let (status, body) = post(router, "/mcp/reconnect", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert!(invoker.is_connected());
    }
}
