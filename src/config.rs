//! Extraction configuration
//!
//! Names every field the pipeline reads from the delta stream. The defaults
//! match OpenAI-style legacy function calling with an `execute` action taking
//! `{"language": .., "code": ..}`.
//!
//! ```rust,ignore
//! use codestream::config::ExtractionConfig;
//!
//! let config = ExtractionConfig::builder()
//!     .selector_key("lang")
//!     .payload_key("source")
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Result, StreamError};

/// Field and action names used by the extraction pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Delta field holding the action object
    pub action_field: String,
    /// Action field holding the action name
    pub name_field: String,
    /// Action field holding the serialized arguments
    pub arguments_field: String,
    /// Delta field holding plain assistant text
    pub content_field: String,
    /// Arguments key emitted as `SelectorReady`
    pub selector_key: String,
    /// Arguments key diffed into `PayloadDelta`s
    pub payload_key: String,
    /// Name of the action handled incrementally instead of being dispatched
    pub builtin_action: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            action_field: defaults::fields::ACTION.to_string(),
            name_field: defaults::fields::NAME.to_string(),
            arguments_field: defaults::fields::ARGUMENTS.to_string(),
            content_field: defaults::fields::CONTENT.to_string(),
            selector_key: defaults::fields::SELECTOR.to_string(),
            payload_key: defaults::fields::PAYLOAD.to_string(),
            builtin_action: defaults::actions::BUILTIN_EXECUTE.to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder starting from the defaults
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder::default()
    }

    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StreamError::ConfigError(format!("Invalid extraction config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject empty names and a selector that aliases the payload
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("action_field", &self.action_field),
            ("name_field", &self.name_field),
            ("arguments_field", &self.arguments_field),
            ("content_field", &self.content_field),
            ("selector_key", &self.selector_key),
            ("payload_key", &self.payload_key),
            ("builtin_action", &self.builtin_action),
        ];
        for (label, value) in named {
            if value.trim().is_empty() {
                return Err(StreamError::ConfigError(format!("{label} must not be empty")));
            }
        }
        if self.selector_key == self.payload_key {
            return Err(StreamError::ConfigError(format!(
                "selector_key and payload_key must differ (both '{}')",
                self.selector_key
            )));
        }
        Ok(())
    }
}

/// Builder for ExtractionConfig
#[derive(Debug, Default)]
pub struct ExtractionConfigBuilder {
    action_field: Option<String>,
    name_field: Option<String>,
    arguments_field: Option<String>,
    content_field: Option<String>,
    selector_key: Option<String>,
    payload_key: Option<String>,
    builtin_action: Option<String>,
}

impl ExtractionConfigBuilder {
    pub fn action_field(mut self, name: impl Into<String>) -> Self {
        self.action_field = Some(name.into());
        self
    }

    pub fn name_field(mut self, name: impl Into<String>) -> Self {
        self.name_field = Some(name.into());
        self
    }

    pub fn arguments_field(mut self, name: impl Into<String>) -> Self {
        self.arguments_field = Some(name.into());
        self
    }

    pub fn content_field(mut self, name: impl Into<String>) -> Self {
        self.content_field = Some(name.into());
        self
    }

    pub fn selector_key(mut self, key: impl Into<String>) -> Self {
        self.selector_key = Some(key.into());
        self
    }

    pub fn payload_key(mut self, key: impl Into<String>) -> Self {
        self.payload_key = Some(key.into());
        self
    }

    pub fn builtin_action(mut self, name: impl Into<String>) -> Self {
        self.builtin_action = Some(name.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ExtractionConfig> {
        let base = ExtractionConfig::default();
        let config = ExtractionConfig {
            action_field: self.action_field.unwrap_or(base.action_field),
            name_field: self.name_field.unwrap_or(base.name_field),
            arguments_field: self.arguments_field.unwrap_or(base.arguments_field),
            content_field: self.content_field.unwrap_or(base.content_field),
            selector_key: self.selector_key.unwrap_or(base.selector_key),
            payload_key: self.payload_key.unwrap_or(base.payload_key),
            builtin_action: self.builtin_action.unwrap_or(base.builtin_action),
        };
        config.validate()?;
        Ok(config)
    }
}
