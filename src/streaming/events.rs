//! Stream events emitted by the extraction pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Events produced while a completion streams.
///
/// `PayloadDelta` texts are append-only fragments: concatenated in arrival
/// order they reconstruct the full payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Plain assistant text, passed through unchanged
    Message { text: String },
    /// The selector (e.g. the code language) is complete and trusted
    SelectorReady { value: String },
    /// New payload characters since the previous `PayloadDelta`
    PayloadDelta { text: String },
    /// A registered, non-built-in action is about to be dispatched
    DispatchRequest {
        action: String,
        parameters: Map<String, Value>,
    },
    /// Result returned by the dispatched action
    Output { value: Value },
}

impl StreamEvent {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn selector_ready(value: impl Into<String>) -> Self {
        Self::SelectorReady {
            value: value.into(),
        }
    }

    pub fn payload_delta(text: impl Into<String>) -> Self {
        Self::PayloadDelta { text: text.into() }
    }

    /// Fragment text if this is a `PayloadDelta`
    pub fn payload_text(&self) -> Option<&str> {
        match self {
            Self::PayloadDelta { text } => Some(text),
            _ => None,
        }
    }

    pub const fn is_selector_ready(&self) -> bool {
        matches!(self, Self::SelectorReady { .. })
    }
}
