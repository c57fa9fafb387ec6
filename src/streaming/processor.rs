//! Stream Session
//!
//! Synchronous per-chunk core of the pipeline. Each completion chunk is merged
//! into the cumulative state, plain content is passed through, the arguments
//! buffer is reparsed from scratch and the parse is fed to the field
//! extractor. The arguments buffer only grows, but repairs of a longer prefix
//! can reinterpret earlier structure, so nothing from a previous parse is
//! reused except the shallow parameter union kept for dispatch.

use serde_json::{Map, Value};

use super::events::StreamEvent;
use super::extractor::FieldExtractor;
use super::json_repair::try_parse;
use super::merge::merge_deltas;
use crate::config::ExtractionConfig;

/// What remains once the upstream stream has closed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutcome {
    /// Payload left undiffed on the final round
    pub trailing: Vec<StreamEvent>,
    /// Merged action name, if any action was announced
    pub action_name: Option<String>,
    /// Union of every legible parse of the arguments buffer (later keys win)
    pub parameters: Map<String, Value>,
}

/// Per-stream accumulation and extraction state
#[derive(Debug, Clone)]
pub struct StreamSession {
    config: ExtractionConfig,
    accumulated: Map<String, Value>,
    parameters: Map<String, Value>,
    last_arguments: Option<Map<String, Value>>,
    extractor: FieldExtractor,
    chunks_seen: usize,
    chunks_skipped: usize,
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl StreamSession {
    pub fn new(config: ExtractionConfig) -> Self {
        let extractor = FieldExtractor::from_config(&config);
        Self {
            config,
            accumulated: Map::new(),
            parameters: Map::new(),
            last_arguments: None,
            extractor,
            chunks_seen: 0,
            chunks_skipped: 0,
        }
    }

    /// Discard all state, as at the start of a new stream
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Process one provider chunk (`{"choices":[{"delta":{..}}]}`).
    ///
    /// Chunks without a first choice carrying an object delta are skipped.
    pub fn process_chunk(&mut self, chunk: Value) -> Vec<StreamEvent> {
        self.chunks_seen += 1;
        match take_delta(chunk) {
            Some(delta) => self.process_delta(delta),
            None => {
                self.chunks_skipped += 1;
                tracing::trace!(chunk = self.chunks_seen, "skipping chunk without a delta");
                Vec::new()
            }
        }
    }

    /// Process one delta object
    pub fn process_delta(&mut self, delta: Map<String, Value>) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(text) = delta
            .get(&self.config.content_field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        {
            events.push(StreamEvent::message(text));
        }

        let state = std::mem::take(&mut self.accumulated);
        self.accumulated = merge_deltas(state, delta);

        let Some(buffer) = self.arguments_buffer() else {
            return events;
        };
        tracing::debug!(state = ?self.accumulated, "accumulated deltas");
        let Some(arguments) = try_parse(buffer) else {
            return events;
        };

        for (key, value) in &arguments {
            self.parameters.insert(key.clone(), value.clone());
        }
        if self.is_builtin_action() {
            events.extend(self.extractor.observe(&arguments));
        }
        self.last_arguments = Some(arguments);
        events
    }

    /// Close the session once the upstream stream has ended.
    ///
    /// Payload diffing starts on the round after `SelectorReady`, so payload
    /// text already present on the selector's round would be lost if the stream
    /// ended there. One last diff against the final parse emits it; the diff is
    /// a no-op whenever the cursor is already up to date.
    pub fn finish(mut self) -> SessionOutcome {
        let mut trailing = Vec::new();
        if self.is_builtin_action() {
            if let Some(arguments) = &self.last_arguments {
                trailing.extend(self.extractor.flush(arguments));
            }
        }
        tracing::debug!(
            chunks = self.chunks_seen,
            skipped = self.chunks_skipped,
            action = ?self.action_name(),
            "stream finished"
        );
        SessionOutcome {
            trailing,
            action_name: self.action_name().map(str::to_string),
            parameters: self.parameters,
        }
    }

    /// Merged action name, if present and non-empty
    pub fn action_name(&self) -> Option<&str> {
        self.action()?
            .get(&self.config.name_field)
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
    }

    /// The raw, possibly truncated arguments string
    pub fn arguments_buffer(&self) -> Option<&str> {
        self.action()?
            .get(&self.config.arguments_field)
            .and_then(Value::as_str)
    }

    pub fn cumulative_state(&self) -> &Map<String, Value> {
        &self.accumulated
    }

    /// Parameters accumulated from every legible parse so far
    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    fn action(&self) -> Option<&Map<String, Value>> {
        self.accumulated
            .get(&self.config.action_field)
            .and_then(Value::as_object)
    }

    fn is_builtin_action(&self) -> bool {
        self.action_name() == Some(self.config.builtin_action.as_str())
    }
}

/// Pull `choices[0].delta` out of a chunk by value
fn take_delta(chunk: Value) -> Option<Map<String, Value>> {
    let Value::Object(mut chunk) = chunk else {
        return None;
    };
    let Value::Array(choices) = chunk.remove("choices")? else {
        return None;
    };
    let Value::Object(mut choice) = choices.into_iter().next()? else {
        return None;
    };
    match choice.remove("delta")? {
        Value::Object(delta) => Some(delta),
        _ => None,
    }
}
