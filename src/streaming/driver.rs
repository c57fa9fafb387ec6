//! Stream Driver
//!
//! Async front of the pipeline. Consumes completion chunks in order, runs each
//! through a [`StreamSession`] and forwards the resulting events before pulling
//! the next chunk. Once the upstream ends, the merged action name is resolved
//! once against the registry; a registered action is dispatched and its output
//! is stored in the injected mailbox and surfaced as an `Output` event.
//!
//! Dropping the returned stream stops consumption. No dispatch happens for a
//! stream that never reached its end.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde_json::Value;

use super::events::StreamEvent;
use super::processor::StreamSession;
use super::types::EventStream;
use crate::config::ExtractionConfig;
use crate::error::StreamError;
use crate::mailbox::OutputMailbox;
use crate::registry::{ActionRecord, ActionRegistry, ResolvedAction};

/// Drives one chunk stream at a time through the extraction pipeline.
///
/// Cheap to clone; clones share the registry and the mailbox.
#[derive(Debug, Clone)]
pub struct StreamDriver {
    config: ExtractionConfig,
    registry: Arc<ActionRegistry>,
    mailbox: OutputMailbox,
}

impl StreamDriver {
    pub fn new(
        config: ExtractionConfig,
        registry: Arc<ActionRegistry>,
        mailbox: OutputMailbox,
    ) -> Self {
        Self {
            config,
            registry,
            mailbox,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn mailbox(&self) -> &OutputMailbox {
        &self.mailbox
    }

    /// Run a chunk stream to completion, yielding events in emission order.
    ///
    /// An upstream error or a failing dispatch ends the event stream with
    /// that error.
    pub fn run<S>(&self, chunks: S) -> EventStream
    where
        S: Stream<Item = Result<Value, StreamError>> + Send + 'static,
    {
        let config = self.config.clone();
        let registry = Arc::clone(&self.registry);
        let mailbox = self.mailbox.clone();

        let events = async_stream::stream! {
            let mut chunks = Box::pin(chunks);
            let mut session = StreamSession::new(config.clone());

            while let Some(chunk) = chunks.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::debug!(error = %e, "upstream failed; ending stream");
                        yield Err(e);
                        return;
                    }
                };
                for event in session.process_chunk(chunk) {
                    yield Ok(event);
                }
            }

            let outcome = session.finish();
            for event in outcome.trailing {
                yield Ok(event);
            }

            let resolved = outcome
                .action_name
                .as_deref()
                .and_then(|name| registry.resolve(name, &config.builtin_action));
            match resolved {
                Some(ResolvedAction::Registered(action)) => {
                    yield Ok(StreamEvent::DispatchRequest {
                        action: action.clone(),
                        parameters: outcome.parameters.clone(),
                    });
                    let record = ActionRecord {
                        name: action.clone(),
                        parameters: outcome.parameters,
                    };
                    match registry.dispatch(record).await {
                        Ok(output) => {
                            tracing::info!(
                                action = %action,
                                output = %output,
                                "storing action output"
                            );
                            mailbox.store(output.clone()).await;
                            yield Ok(StreamEvent::Output { value: output });
                        }
                        Err(e) => {
                            tracing::debug!(action = %action, error = %e, "dispatch failed");
                            yield Err(e);
                        }
                    }
                }
                Some(ResolvedAction::BuiltinExecute) => {}
                None => {
                    if let Some(name) = outcome.action_name {
                        tracing::debug!(action = %name, "no handler for action; dropping");
                    }
                }
            }
        };

        Box::pin(events)
    }
}
