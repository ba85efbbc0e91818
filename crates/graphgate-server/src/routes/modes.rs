//! Question-driven modes: `/method1`, `/method2` and `/no-rag`.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::envelope::Envelope;
use crate::error::{PipelineError, Result};
use crate::state::AppState;

/// Body accepted by every question-driven mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    #[serde(rename = "naturalLanguage")]
    pub natural_language: String,
}

fn question(body: std::result::Result<Json<QuestionRequest>, JsonRejection>) -> Result<String> {
    let Json(request) = body?;
    let question = request.natural_language.trim();
    if question.is_empty() {
        return Err(PipelineError::bad_request("naturalLanguage must not be empty").into());
    }
    Ok(question.to_string())
}

/// Direct-Cypher mode: synthesize, run, ground.
pub async fn method1_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let question = question(body)?;
    info!(mode = "method1", "Handling question");

    let answered = state.pipeline.direct_cypher(&question).await?;
    Ok(Json(
        Envelope::success()
            .with_mode("method1")
            .with_cypher(answered.cypher)
            .with_grounded_answer(answered.answer),
    ))
}

/// Retriever mode: the peer generates and runs the query, then ground.
pub async fn method2_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let question = question(body)?;
    info!(mode = "method2", "Handling question");

    let answered = state.pipeline.retriever(&question).await?;
    Ok(Json(
        Envelope::success()
            .with_mode("method2")
            .with_cypher(answered.cypher)
            .with_grounded_answer(answered.answer),
    ))
}

/// No-grounding mode: synthesize and run, return the raw data.
pub async fn no_rag_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let question = question(body)?;
    info!(mode = "no-rag", "Handling question");

    let retrieved = state.pipeline.no_grounding(&question).await?;
    Ok(Json(
        Envelope::success()
            .with_mode("no-rag")
            .with_cypher(retrieved.cypher)
            .with_result(retrieved.data)
            .with_table(retrieved.table),
    ))
}
