//! Orchestration modes.
//!
//! Each mode is a fixed composition of synthesize, invoke, normalize and
//! ground. Any step's failure ends the request; only a grounding failure keeps
//! the query and data computed before it.

use graphgate_config::ToolsConfig;
use graphgate_llm::SharedBackend;
use graphgate_mcp::{McpError, SharedInvoker, ToolResult};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{PipelineError, Result, ServerError};
use crate::normalize::{
    GraphData, Table, extract_table, normalize, reported_failure, structured_payload,
};
use crate::synth::{AnswerSynthesizer, QuerySynthesizer};

/// A grounded answer and the query behind it.
#[derive(Debug, Clone)]
pub struct Answered {
    pub cypher: String,
    pub answer: String,
}

/// Raw retrieval output.
#[derive(Debug, Clone)]
pub struct Retrieved {
    pub cypher: String,
    pub data: GraphData,
    pub table: Option<Table>,
}

/// The request pipeline shared by all handlers.
pub struct Pipeline {
    invoker: SharedInvoker,
    query: QuerySynthesizer,
    answer: AnswerSynthesizer,
    tools: ToolsConfig,
    schema_hint: String,
}

impl Pipeline {
    pub fn new(invoker: SharedInvoker, llm: SharedBackend, config: &ServerConfig) -> Self {
        Self {
            invoker,
            query: QuerySynthesizer::new(llm.clone(), config.model.clone(), config.max_tokens),
            answer: AnswerSynthesizer::new(llm, config.model.clone(), config.max_tokens),
            tools: config.tools.clone(),
            schema_hint: config.schema_hint.clone(),
        }
    }

    /// The tool invoker.
    pub fn invoker(&self) -> &SharedInvoker {
        &self.invoker
    }

    /// The configured tool names.
    pub fn tools(&self) -> &ToolsConfig {
        &self.tools
    }

    /// Synthesize, run on the read tool, ground.
    pub async fn direct_cypher(&self, question: &str) -> Result<Answered> {
        let retrieved = self.no_grounding(question).await?;
        debug!(mode = "method1", "Grounding answer");
        self.ground(question, retrieved.cypher, retrieved.data).await
    }

    /// Let the peer's text-to-query tool retrieve, then ground.
    pub async fn retriever(&self, question: &str) -> Result<Answered> {
        let tool = &self.tools.text2cypher;
        debug!(mode = "method2", tool = %tool, "Invoking retriever");
        let result = self.invoke(tool, json!({ "query": question })).await?;
        let (cypher, data) = retriever_output(&result)?;
        self.ground(question, cypher, data).await
    }

    /// Synthesize and run on the read tool, without grounding.
    pub async fn no_grounding(&self, question: &str) -> Result<Retrieved> {
        let cypher = self.query.synthesize(question, &self.schema_hint).await?;

        let tool = &self.tools.read;
        debug!(tool = %tool, query_len = cypher.len(), "Invoking read tool");
        let result = self.invoke(tool, json!({ "query": cypher })).await?;

        Ok(Retrieved {
            data: normalize(&result),
            table: extract_table(&result),
            cypher,
        })
    }

    /// Forward a named tool call unchanged.
    pub async fn passthrough(&self, tool: &str, arguments: Value) -> Result<ToolResult> {
        debug!(tool = %tool, "Passing tool call through");
        self.invoke(tool, arguments).await
    }

    async fn invoke(&self, tool: &str, arguments: Value) -> Result<ToolResult> {
        let result = self.invoker.invoke(tool, arguments).await?;
        if let Some(error) = reported_failure(&result) {
            return Err(McpError::tool_error(error).into());
        }
        Ok(result)
    }

    async fn ground(&self, question: &str, cypher: String, data: GraphData) -> Result<Answered> {
        match self.answer.ground(question, &data, &cypher).await {
            Ok(answer) => Ok(Answered { cypher, answer }),
            Err(error) => Err(ServerError::Partial {
                error,
                cypher,
                result: data,
            }),
        }
    }
}

/// Pull `(cypher, data)` out of a text-to-query tool response.
fn retriever_output(result: &ToolResult) -> std::result::Result<(String, GraphData), PipelineError> {
    let payload = structured_payload(result).unwrap_or_default();

    let cypher = ["cypher", "query"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| McpError::tool_error("retriever response did not include a query"))?
        .to_string();

    let data = match payload.get("data") {
        Some(data) => GraphData::Value(data.clone()),
        None => normalize(result),
    };

    Ok((cypher, data))
}
