//! Query and answer synthesis over the text-generation backend.

use graphgate_llm::{CompletionRequest, Message, SharedBackend};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::normalize::GraphData;

/// Upper bound on the serialized data embedded in a grounding prompt.
pub const MAX_CONTEXT_CHARS: usize = 8000;

/// Sampling temperature for query synthesis.
pub const QUERY_TEMPERATURE: f32 = 0.0;

/// Sampling temperature for grounded answers.
pub const ANSWER_TEMPERATURE: f32 = 0.2;

/// Stand-in context when a query returned nothing.
const NO_DATA: &str = "(no data returned)";

/// Language tags models put after an inline opening fence.
const FENCE_TAGS: [&str; 3] = ["cypher", "neo4j", "sql"];

/// Remove markdown code fences around a completion.
///
/// Drops a leading fence along with its language tag, a trailing fence, and
/// surrounding whitespace. On a single-line fence only a known tag is dropped,
/// so the first keyword of an untagged query survives.
pub fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => strip_fence_tag(rest),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim().to_string()
}

fn strip_fence_tag(line: &str) -> &str {
    let word_end = line.find(char::is_whitespace).unwrap_or(line.len());
    let word = &line[..word_end];
    if FENCE_TAGS.iter().any(|tag| word.eq_ignore_ascii_case(tag)) {
        &line[word_end..]
    } else {
        line
    }
}

/// Cut `text` to at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query synthesis
// ─────────────────────────────────────────────────────────────────────────────

/// Turns a question into a Cypher statement.
#[derive(Clone)]
pub struct QuerySynthesizer {
    backend: SharedBackend,
    model: String,
    max_tokens: u32,
}

impl QuerySynthesizer {
    pub fn new(backend: SharedBackend, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens,
        }
    }

    /// Synthesize a query for `question` against the graph described by `schema_hint`.
    ///
    /// Exactly one completion call; a backend error or an empty statement is a
    /// [`PipelineError::Synthesis`].
    pub async fn synthesize(
        &self,
        question: &str,
        schema_hint: &str,
    ) -> Result<String, PipelineError> {
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![Message::user(question)],
            self.max_tokens,
        )
        .with_system(query_prompt(schema_hint))
        .with_temperature(QUERY_TEMPERATURE);

        let response = self
            .backend
            .complete(request)
            .await
            .map_err(PipelineError::synthesis)?;

        let cypher = strip_code_fences(response.text());
        if cypher.is_empty() {
            return Err(PipelineError::synthesis("model returned an empty query"));
        }
        if response.truncated() {
            warn!(max_tokens = self.max_tokens, "query hit the token limit and may be incomplete");
        }
        debug!(query_len = cypher.len(), "Synthesized query");
        Ok(cypher)
    }
}

fn query_prompt(schema_hint: &str) -> String {
    format!(
        "You translate questions into Cypher for a Neo4j graph.\n\n\
         Schema:\n{schema_hint}\n\n\
         Respond with a single read-only Cypher statement and nothing else. \
         Do not explain it. Do not write to the graph."
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Answer synthesis
// ─────────────────────────────────────────────────────────────────────────────

/// Phrases an answer from retrieved graph data.
#[derive(Clone)]
pub struct AnswerSynthesizer {
    backend: SharedBackend,
    model: String,
    max_tokens: u32,
}

impl AnswerSynthesizer {
    pub fn new(backend: SharedBackend, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens,
        }
    }

    /// Answer `question` using only `data`, retrieved by `query`.
    pub async fn ground(
        &self,
        question: &str,
        data: &GraphData,
        query: &str,
    ) -> Result<String, PipelineError> {
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![Message::user(grounding_prompt(question, data, query))],
            self.max_tokens,
        )
        .with_temperature(ANSWER_TEMPERATURE);

        let response = self
            .backend
            .complete(request)
            .await
            .map_err(PipelineError::grounding)?;

        let answer = response.text().trim();
        if answer.is_empty() {
            return Err(PipelineError::grounding("model returned an empty answer"));
        }
        Ok(answer.to_string())
    }
}

fn grounding_prompt(question: &str, data: &GraphData, query: &str) -> String {
    let rendered = data.render();
    let context = if rendered.trim().is_empty() {
        NO_DATA
    } else {
        truncate_chars(&rendered, MAX_CONTEXT_CHARS)
    };

    format!(
        "Answer the Question using only this Context. If the Context is empty or \
         does not contain the answer, say that there is not enough grounding data \
         to answer.\n\n\
         # Question:\n{question}\n\n\
         # Context:\n{context}\n\n\
         # Query:\n{query}\n\n\
         # Answer:\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use graphgate_llm::{LlmError, MockBackend};
    use serde_json::json;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```cypher\nMATCH (n) RETURN n\n```"),
            "MATCH (n) RETURN n"
        );
        assert_eq!(strip_code_fences("```\nMATCH (n)\n```\n"), "MATCH (n)");
        assert_eq!(strip_code_fences("  MATCH (n) RETURN n \n"), "MATCH (n) RETURN n");
        assert_eq!(strip_code_fences("```cypher MATCH (n)```"), "MATCH (n)");
        assert_eq!(
            strip_code_fences("```MATCH (n) RETURN n```"),
            "MATCH (n) RETURN n"
        );
        assert_eq!(strip_code_fences("```Cypher MATCH (n)```"), "MATCH (n)");
        assert_eq!(strip_code_fences("```"), "");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_grounding_prompt_truncates_context() {
        let big = GraphData::Value(json!("x".repeat(MAX_CONTEXT_CHARS + 500)));
        let prompt = grounding_prompt("q", &big, "MATCH (n) RETURN n");
        assert!(prompt.contains(&"x".repeat(MAX_CONTEXT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CONTEXT_CHARS + 1)));
    }

    #[test]
    fn test_grounding_prompt_marks_empty_data() {
        let prompt = grounding_prompt("who?", &GraphData::Empty, "MATCH (n) RETURN n");
        assert!(prompt.contains("# Context:\n(no data returned)"));
        assert!(prompt.contains("# Question:\nwho?"));
        assert!(prompt.contains("# Query:\nMATCH (n) RETURN n"));
    }

    #[tokio::test]
    async fn test_synthesize_uses_zero_temperature_and_strips_fences() {
        let backend = Arc::new(MockBackend::with_text("```cypher\nMATCH (n) RETURN n\n```"));
        let synth = QuerySynthesizer::new(backend.clone(), "test-model", 256);

        let cypher = synth.synthesize("everything", "(:Node)").await.unwrap();

        assert_eq!(cypher, "MATCH (n) RETURN n");
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert!(requests[0].system.as_deref().unwrap().contains("(:Node)"));
    }

    #[tokio::test]
    async fn test_synthesize_empty_is_failure() {
        let backend = Arc::new(MockBackend::with_text("```cypher\n```"));
        let synth = QuerySynthesizer::new(backend, "test-model", 256);
        let err = synth.synthesize("q", "").await.unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_synthesize_backend_error_is_failure() {
        let backend = Arc::new(MockBackend::new(vec![]).then_error(LlmError::Network("down".into())));
        let synth = QuerySynthesizer::new(backend, "test-model", 256);
        let err = synth.synthesize("q", "").await.unwrap_err();
        assert!(matches!(err, PipelineError::Synthesis(_)));
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn test_ground_uses_low_temperature() {
        let backend = Arc::new(MockBackend::with_text("  Acme supplies X.  "));
        let synth = AnswerSynthesizer::new(backend.clone(), "test-model", 256);

        let answer = synth
            .ground("who supplies X?", &GraphData::Value(json!([{"s": "Acme"}])), "MATCH ...")
            .await
            .unwrap();

        assert_eq!(answer, "Acme supplies X.");
        let temperature = backend.requests()[0].temperature.unwrap();
        assert!(temperature > 0.0 && temperature < 0.5);
    }

    #[tokio::test]
    async fn test_ground_error_is_grounding_failure() {
        let backend = Arc::new(MockBackend::new(vec![]).then_error(LlmError::Backend("500".into())));
        let synth = AnswerSynthesizer::new(backend, "test-model", 256);
        let err = synth.ground("q", &GraphData::Empty, "MATCH").await.unwrap_err();
        assert!(matches!(err, PipelineError::Grounding(_)));
    }
}
