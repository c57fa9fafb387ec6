//! Core error types.

use thiserror::Error;

/// Errors surfaced by the streaming pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// An SSE payload could not be decoded as a JSON chunk
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The upstream delta stream failed
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A registered action handler failed; propagated unchanged to the caller
    #[error("Dispatch of action '{action}' failed: {message}")]
    DispatchError { action: String, message: String },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Tracing subscriber could not be installed
    #[error("Telemetry initialization error: {0}")]
    TelemetryInit(String),

    /// JSON serialization/deserialization failure
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Coarse classification used for logging and user-facing summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Framing,
    Dispatch,
    Configuration,
    Internal,
}

impl StreamError {
    /// Create a dispatch error for the named action
    pub fn dispatch(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DispatchError {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from an action handler
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::DispatchError { .. })
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::StreamError(_) => ErrorCategory::Transport,
            Self::ParseError(_) => ErrorCategory::Framing,
            Self::DispatchError { .. } => ErrorCategory::Dispatch,
            Self::ConfigError(_) | Self::TelemetryInit(_) => ErrorCategory::Configuration,
            Self::JsonError(_) => ErrorCategory::Internal,
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, StreamError>;
