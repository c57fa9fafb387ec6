//! Default Configuration Values
//!
//! This module centralizes the field names, action names and environment
//! variables the extraction pipeline uses when nothing else is configured.

/// Field names inside a streamed delta and inside the arguments object
pub mod fields {
    /// Delta field carrying the action (`{"function_call": {"name": .., "arguments": ..}}`)
    pub const ACTION: &str = "function_call";

    /// Field of the action holding its name
    pub const NAME: &str = "name";

    /// Field of the action holding the serialized, possibly truncated parameters
    pub const ARGUMENTS: &str = "arguments";

    /// Delta field carrying plain assistant text
    pub const CONTENT: &str = "content";

    /// Arguments key that selects the language of the payload
    pub const SELECTOR: &str = "language";

    /// Arguments key holding the code body
    pub const PAYLOAD: &str = "code";
}

/// Action names
pub mod actions {
    /// The action whose selector/payload are extracted while streaming
    pub const BUILTIN_EXECUTE: &str = "execute";
}

/// SSE framing
pub mod sse {
    /// `data:` payload marking the end of a completion stream
    pub const DONE_MARKER: &str = "[DONE]";
}

/// Logging environment variables
pub mod logging {
    /// Log level (trace, debug, info, warn, error)
    pub const ENV_LEVEL: &str = "CODESTREAM_LOG_LEVEL";

    /// Output format (text, json, json-compact)
    pub const ENV_FORMAT: &str = "CODESTREAM_LOG_FORMAT";

    /// Log file path
    pub const ENV_FILE: &str = "CODESTREAM_LOG_FILE";
}
