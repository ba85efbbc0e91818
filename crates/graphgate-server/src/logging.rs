//! Per-request access log.

use std::time::Instant;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::state::AppState;

/// One line per request. 5xx logs at error, 4xx at warn, the rest at info.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let code = status.as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match () {
        _ if status.is_server_error() => {
            tracing::error!(%method, %path, status = code, elapsed_ms, "request failed")
        }
        _ if status.is_client_error() => {
            tracing::warn!(%method, %path, status = code, elapsed_ms, "request rejected")
        }
        _ => tracing::info!(%method, %path, status = code, elapsed_ms, "request served"),
    }

    response
}
