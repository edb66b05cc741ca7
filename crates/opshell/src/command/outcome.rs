//! The uniform result shape every execution path normalizes into.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ShellError;

/// Outcome of a command invocation.
///
/// Success and failure share this one shape; `error` carries a
/// machine-readable code and `message` the human-readable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl CommandOutcome {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            metadata: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            message: None,
            metadata: None,
        }
    }

    pub fn ok_with_message(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
            metadata: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(code.into()),
            message: Some(message.into()),
            metadata: None,
        }
    }

    /// Merge one metadata entry, keeping anything already present.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }
}

impl From<ShellError> for CommandOutcome {
    fn from(err: ShellError) -> Self {
        CommandOutcome::failure(err.code().to_string(), err.to_string())
    }
}
