//! Core Streaming Types

use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

use crate::error::StreamError;

pub use super::events::StreamEvent;

/// Event Stream - output of [`StreamDriver::run`](super::StreamDriver::run)
///
/// A pinned, boxed stream yielding `StreamEvent` items in emission order.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, StreamError>> + Send>>;

/// Chunk Stream - raw provider completion chunks (`{"choices":[{"delta":..}]}`)
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Value, StreamError>> + Send>>;
