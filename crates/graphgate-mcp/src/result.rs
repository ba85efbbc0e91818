//! Tagged representation of whatever a tool call hands back.
//!
//! MCP peers disagree on result shapes: some return `structuredContent`, some a
//! `content` array of typed blocks, some a bare string. Classification happens
//! once here so downstream code can match exhaustively instead of probing fields.

use serde::Serialize;
use serde_json::{Map, Value};

/// One element of a `content` sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// The block's `type` tag, if it had one.
    pub kind: Option<String>,
    /// The block object as received.
    pub payload: Value,
}

impl Block {
    /// The block text, when this block is textual.
    ///
    /// A block counts as textual when tagged `"text"`, or when it is untagged
    /// and carries a string `text` field.
    pub fn text(&self) -> Option<&str> {
        match self.kind.as_deref() {
            Some("text") | None => self.payload.get("text").and_then(Value::as_str),
            Some(_) => None,
        }
    }

    /// The block's embedded JSON, for `{type: "json", json: ...}` blocks.
    pub fn json(&self) -> Option<&Value> {
        match self.kind.as_deref() {
            Some("json") => self.payload.get("json"),
            _ => None,
        }
    }

    fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            kind,
            payload: value,
        }
    }
}

/// A tool call result, classified by shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "value", rename_all = "snake_case")]
pub enum ToolResult {
    /// A JSON value exposed directly (`structuredContent`, `json`, or an
    /// already-unwrapped payload).
    Direct(Value),
    /// A plain text payload.
    Textual(String),
    /// A `content` sequence of typed blocks.
    Blocks(Vec<Block>),
    /// Nothing recognisable (bare numbers, booleans, null).
    Unrecognized(Value),
}

impl ToolResult {
    /// Classify a raw `tools/call` result.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_object(map),
            Value::String(text) => Self::Textual(text),
            Value::Array(_) => Self::Direct(value),
            other => Self::Unrecognized(other),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        for key in ["structuredContent", "json"] {
            if let Some(direct) = map.remove(key).filter(|v| !v.is_null()) {
                return Self::Direct(direct);
            }
        }

        if let Some(Value::String(text)) = map.get("text") {
            return Self::Textual(text.clone());
        }

        match map.remove("content") {
            Some(Value::Array(items)) => {
                Self::Blocks(items.into_iter().map(Block::from_value).collect())
            }
            Some(single @ Value::Object(_)) => Self::Blocks(vec![Block::from_value(single)]),
            Some(other) => {
                map.insert("content".to_string(), other);
                Self::Direct(Value::Object(map))
            }
            None => Self::Direct(Value::Object(map)),
        }
    }

    /// Concatenated text of all textual blocks, for error messages.
    pub fn text(&self) -> String {
        match self {
            Self::Textual(text) => text.clone(),
            Self::Blocks(blocks) => blocks
                .iter()
                .filter_map(Block::text)
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Direct(value) | Self::Unrecognized(value) => value.to_string(),
        }
    }
}

/// Whether a raw `tools/call` result is flagged `isError`.
pub fn is_error_result(value: &Value) -> bool {
    value
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
