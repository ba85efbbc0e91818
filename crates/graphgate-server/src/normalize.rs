//! Result normalization.
//!
//! Turns a classified [`ToolResult`] into [`GraphData`] by an ordered fallback:
//!
//! 1. a direct JSON value
//! 2. a direct text payload, verbatim
//! 3. the first textual block of a `content` sequence, parsed as JSON, with the
//!    answer taken from `graphData`, `rows` or `records` (first present wins);
//!    the raw block text when parsing fails or none of those keys exist
//! 4. the first `{type: "json"}` block
//! 5. the empty sentinel
//!
//! Normalization never fails. Tabular rows are extracted separately by
//! [`extract_table`].

use graphgate_mcp::{Block, ToolResult};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys probed, in order, for the answer payload inside parsed block text.
const ANSWER_KEYS: [&str; 3] = ["graphData", "rows", "records"];

/// The payload extracted from a tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphData {
    /// Something usable was found.
    Value(Value),
    /// Nothing extractable. Serializes as `""`.
    Empty,
}

impl GraphData {
    /// Whether nothing was extracted.
    pub fn is_empty(&self) -> bool {
        matches!(self, GraphData::Empty)
    }

    /// The payload as JSON, with the sentinel rendered as `""`.
    pub fn into_value(self) -> Value {
        match self {
            GraphData::Value(value) => value,
            GraphData::Empty => Value::String(String::new()),
        }
    }

    /// Text form used in prompts: strings verbatim, everything else compact JSON.
    pub fn render(&self) -> String {
        match self {
            GraphData::Value(Value::String(text)) => text.clone(),
            GraphData::Value(value) => value.to_string(),
            GraphData::Empty => String::new(),
        }
    }
}

impl Serialize for GraphData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GraphData::Value(value) => value.serialize(serializer),
            GraphData::Empty => serializer.serialize_str(""),
        }
    }
}

impl From<GraphData> for Value {
    fn from(data: GraphData) -> Self {
        data.into_value()
    }
}

/// Extract [`GraphData`] from a tool result.
pub fn normalize(result: &ToolResult) -> GraphData {
    match result {
        ToolResult::Direct(value) => GraphData::Value(value.clone()),
        ToolResult::Textual(text) => GraphData::Value(Value::String(text.clone())),
        ToolResult::Blocks(blocks) => normalize_blocks(blocks),
        ToolResult::Unrecognized(_) => GraphData::Empty,
    }
}

fn normalize_blocks(blocks: &[Block]) -> GraphData {
    if let Some(text) = first_text(blocks) {
        let answer = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => answer_field(&map).cloned(),
            _ => None,
        };
        return GraphData::Value(answer.unwrap_or_else(|| Value::String(text.to_string())));
    }

    // Peers that emit `{type: "json"}` blocks instead of text.
    match blocks.iter().find_map(Block::json) {
        Some(value) if !value.is_null() => GraphData::Value(value.clone()),
        _ => GraphData::Empty,
    }
}

fn first_text(blocks: &[Block]) -> Option<&str> {
    blocks.iter().find_map(Block::text)
}

fn answer_field(map: &Map<String, Value>) -> Option<&Value> {
    ANSWER_KEYS.iter().find_map(|key| map.get(*key))
}

/// The result's structured object, if it has one.
///
/// A direct JSON object is returned as-is. Otherwise text (a direct text
/// payload or the first textual block) is parsed and kept only if it is an
/// object.
pub fn structured_payload(result: &ToolResult) -> Option<Map<String, Value>> {
    match parsed(result)? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// The `error` of a structured `{ok: false, ...}` payload.
///
/// Tools on the peer report their own failures this way instead of setting
/// `isError`.
pub fn reported_failure(result: &ToolResult) -> Option<String> {
    let payload = structured_payload(result)?;
    if payload.get("ok").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let error = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("tool reported failure");
    Some(error.to_string())
}

fn parsed(result: &ToolResult) -> Option<Value> {
    match result {
        ToolResult::Direct(value) => Some(value.clone()),
        ToolResult::Textual(text) => serde_json::from_str(text).ok(),
        ToolResult::Blocks(blocks) => match first_text(blocks) {
            Some(text) => serde_json::from_str(text).ok(),
            None => blocks.iter().find_map(Block::json).cloned(),
        },
        ToolResult::Unrecognized(_) => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tabular extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Rows of uniform objects with columns taken from the first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column identifiers, from the first row's keys.
    pub columns: Vec<String>,
    /// The rows as received.
    pub rows: Vec<Value>,
}

/// Pull tabular rows out of a tool result, when present.
///
/// Looks at the parsed payload itself when it is an array, otherwise at the
/// first array found under `graphData`, `rows` or `records`. Every element must
/// be an object and the first must have at least one key.
pub fn extract_table(result: &ToolResult) -> Option<Table> {
    let value = parsed(result)?;
    let rows = match &value {
        Value::Array(rows) => rows,
        Value::Object(map) => ANSWER_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))?,
        _ => return None,
    };

    if !rows.iter().all(Value::is_object) {
        return None;
    }
    let columns: Vec<String> = rows.first()?.as_object()?.keys().cloned().collect();
    if columns.is_empty() {
        return None;
    }

    Some(Table {
        columns,
        rows: rows.clone(),
    })
}
