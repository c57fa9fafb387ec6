//! Field Extraction
//!
//! Watches the best-effort parse of the arguments buffer after every delta and
//! turns it into ordered selector/payload events. The selector is trusted only
//! once the payload key has appeared as well: a selector value still being
//! typed would otherwise look complete after repair (`"py"` for `"python"`).
//! This is a heuristic, not a guarantee; a selector could in principle be
//! truncated at a point where the payload key is already visible.

use serde_json::{Map, Value};

use super::events::StreamEvent;
use crate::config::ExtractionConfig;

/// Progress of one stream's extraction. Only ever advances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionCursor {
    selector: Option<String>,
    payload_observed: String,
}

impl ExtractionCursor {
    pub fn selector_emitted(&self) -> bool {
        self.selector.is_some()
    }

    /// The selector value, once emitted
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// Concatenation of every payload fragment emitted so far
    pub fn payload_observed(&self) -> &str {
        &self.payload_observed
    }
}

/// Selector-then-payload state machine over parsed arguments.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    selector_key: String,
    payload_key: String,
    cursor: ExtractionCursor,
}

impl FieldExtractor {
    pub fn new(selector_key: impl Into<String>, payload_key: impl Into<String>) -> Self {
        Self {
            selector_key: selector_key.into(),
            payload_key: payload_key.into(),
            cursor: ExtractionCursor::default(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.selector_key.clone(), config.payload_key.clone())
    }

    pub fn cursor(&self) -> &ExtractionCursor {
        &self.cursor
    }

    /// Observe the arguments as parsed after the latest delta.
    ///
    /// Emits `SelectorReady` at most once, on the first round where the
    /// selector is a non-empty string and the payload key is present. Payload
    /// diffing starts on the following round; the round that trusts the
    /// selector emits nothing else.
    pub fn observe(&mut self, arguments: &Map<String, Value>) -> Vec<StreamEvent> {
        if !self.cursor.selector_emitted() {
            return self.try_emit_selector(arguments).into_iter().collect();
        }
        self.diff_payload(arguments).into_iter().collect()
    }

    /// Final diff at stream end. Emits nothing when the cursor is up to date
    /// or the selector was never trusted.
    ///
    /// Needed because the round that trusts the selector does not diff the
    /// payload: without it, a stream whose last delta completes both fields
    /// would never emit its payload.
    pub fn flush(&mut self, arguments: &Map<String, Value>) -> Option<StreamEvent> {
        if !self.cursor.selector_emitted() {
            return None;
        }
        self.diff_payload(arguments)
    }

    fn try_emit_selector(&mut self, arguments: &Map<String, Value>) -> Option<StreamEvent> {
        let selector = arguments
            .get(&self.selector_key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?;
        if !arguments.contains_key(&self.payload_key) {
            return None;
        }
        tracing::debug!(selector = %selector, "selector ready");
        self.cursor.selector = Some(selector.to_string());
        Some(StreamEvent::selector_ready(selector))
    }

    fn diff_payload(&mut self, arguments: &Map<String, Value>) -> Option<StreamEvent> {
        let current = arguments.get(&self.payload_key).and_then(Value::as_str)?;
        let Some(suffix) = current.strip_prefix(self.cursor.payload_observed.as_str()) else {
            // A reparse can momentarily disagree with what was already emitted
            tracing::debug!(
                observed = self.cursor.payload_observed.len(),
                current = current.len(),
                "payload diverged from emitted prefix; skipping round"
            );
            return None;
        };
        if suffix.is_empty() {
            return None;
        }
        let event = StreamEvent::payload_delta(suffix);
        self.cursor.payload_observed = current.to_string();
        Some(event)
    }
}
