//! The uniform response body shared by every endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{GraphData, Table};

/// `{ok, mode?, cypher?, result?, groundedAnswer?, error?}` plus the
/// endpoint-specific extras.
///
/// `ok == true` never carries `error`. `ok == false` carries `error` and
/// `kind`, and only carries `cypher`/`result` when `partial` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cypher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
}

impl Envelope {
    /// An `ok: true` envelope with nothing else set.
    pub fn success() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    /// An `ok: false` envelope.
    pub fn failure(error: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_cypher(mut self, cypher: impl Into<String>) -> Self {
        self.cypher = Some(cypher.into());
        self
    }

    pub fn with_result(mut self, result: impl Into<Value>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_grounded_answer(mut self, answer: impl Into<String>) -> Self {
        self.grounded_answer = Some(answer.into());
        self
    }

    pub fn with_table(mut self, table: Option<Table>) -> Self {
        self.table = table;
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the work done before a late failure, tagged `partial: true`.
    pub fn with_partial(mut self, cypher: impl Into<String>, result: GraphData) -> Self {
        self.partial = Some(true);
        self.cypher = Some(cypher.into());
        self.result = Some(result.into_value());
        self
    }
}
