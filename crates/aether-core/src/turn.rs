// ABOUTME: Defines conversation turns (user input, model output, tool results) and history entries.
// ABOUTME: A model turn carries ordered parts, each either plain text or a named function call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

/// A model's request to invoke a tool by name with JSON arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// One piece of a model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    FunctionCall { call: FunctionCall },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Part::FunctionCall {
            call: FunctionCall::new(name, args),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::FunctionCall { .. } => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall { call } => Some(call),
            Part::Text { .. } => None,
        }
    }
}

/// One causal step of a conversation. A `ToolResult` only ever follows a
/// `Model` turn containing a call to the same tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    User { text: String },
    Model { parts: Vec<Part> },
    ToolResult { tool_name: String, result: String },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::User { text: text.into() }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Turn::Model { parts }
    }

    pub fn tool_result(tool_name: impl Into<String>, result: impl Into<String>) -> Self {
        Turn::ToolResult {
            tool_name: tool_name.into(),
            result: result.into(),
        }
    }

    /// Function calls carried by a model turn, in part order. Empty for
    /// every other kind of turn.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        match self {
            Turn::Model { parts } => parts.iter().filter_map(Part::as_function_call).collect(),
            _ => Vec::new(),
        }
    }

    /// The first non-empty text part of a model turn.
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Turn::Model { parts } => parts
                .iter()
                .filter_map(Part::as_text)
                .find(|t| !t.is_empty()),
            Turn::User { text } => Some(text),
            Turn::ToolResult { .. } => None,
        }
    }
}

/// A turn as recorded in an agent's history, stamped for observers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entry_id: Ulid,
    pub timestamp: DateTime<Utc>,
    pub turn: Turn,
}

impl HistoryEntry {
    /// Wrap a turn with a fresh ULID and the current timestamp.
    pub fn new(turn: Turn) -> Self {
        Self {
            entry_id: Ulid::new(),
            timestamp: Utc::now(),
            turn,
        }
    }
}
