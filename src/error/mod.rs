//! Error Handling Module
//!
//! Only the edges of the pipeline can fail: upstream transport, SSE framing,
//! action dispatch and configuration. Merging deltas, repairing partial JSON
//! and diffing payloads never return errors; partial input is their normal
//! operating condition.
//!
//! # Example
//!
//! ```rust,ignore
//! use codestream::error::{ErrorCategory, StreamError};
//!
//! let error = StreamError::dispatch("search", "index unavailable");
//! assert_eq!(error.category(), ErrorCategory::Dispatch);
//! ```

mod conversions;
pub mod types;

pub use types::*;
