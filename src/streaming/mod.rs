//! Streaming Module
//!
//! Incremental extraction over streamed function-call completions.
//! This module contains:
//! - Delta merging into a cumulative state
//! - Tolerant parsing of truncated JSON arguments
//! - Selector/payload extraction with append-only payload diffs
//! - The per-stream session and the async stream driver
//! - SSE framing for provider byte streams

mod driver;
mod events;
mod extractor;
mod json_repair;
mod merge;
mod processor;
mod sse;
mod types;

// Re-exports
pub use driver::*;
pub use events::*;
pub use extractor::*;
pub use json_repair::*;
pub use merge::*;
pub use processor::*;
pub use sse::*;
pub use types::*;
