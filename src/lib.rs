//! # codestream
//!
//! Incremental extraction of structured code actions from streamed LLM
//! function-call completions.
//!
#![deny(unsafe_code)]

//! A model that answers with a function call streams its `arguments` string a
//! few characters at a time. `codestream` merges those deltas, repairs the
//! truncated JSON after every delta, and emits:
//!
//! - `SelectorReady` once the selector field (the code language) is trusted
//! - `PayloadDelta` fragments of the payload field (the code) as it grows
//! - `Message` for plain assistant text
//! - `DispatchRequest` / `Output` when the stream ends on a registered action
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use codestream::prelude::*;
//! use futures::StreamExt;
//!
//! let mut registry = ActionRegistry::new();
//! registry.register_fn("search", |_, params| Ok(serde_json::json!({"query": params["q"]})));
//!
//! let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), OutputMailbox::new());
//! let mut events = driver.run(chunks_from_sse(byte_stream));
//! while let Some(event) = events.next().await {
//!     match event? {
//!         StreamEvent::SelectorReady { value } => println!("language: {value}"),
//!         StreamEvent::PayloadDelta { text } => print!("{text}"),
//!         other => println!("{other:?}"),
//!     }
//! }
//! ```

pub mod config;
pub mod defaults;
pub mod error;
pub mod mailbox;
pub mod registry;
pub mod streaming;
pub mod telemetry;

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ErrorCategory, Result, StreamError};
pub use mailbox::OutputMailbox;
pub use registry::{ActionHandler, ActionRecord, ActionRegistry, ResolvedAction};
pub use streaming::{EventStream, StreamDriver, StreamEvent, StreamSession};

/// Commonly used types
pub mod prelude {
    pub use crate::config::ExtractionConfig;
    pub use crate::error::{Result, StreamError};
    pub use crate::mailbox::OutputMailbox;
    pub use crate::registry::{ActionHandler, ActionRecord, ActionRegistry, ResolvedAction};
    pub use crate::streaming::{
        ChunkStream, EventStream, SessionOutcome, StreamDriver, StreamEvent, StreamSession,
        chunks_from_sse,
    };
}
