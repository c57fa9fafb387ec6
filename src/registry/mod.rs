//! Action Registry
//!
//! Maps action names to handlers that run once a stream ends on a non-built-in
//! action. Resolution is a closed choice made at stream end: either the
//! built-in `execute` action, already handled incrementally while streaming,
//! or a registered action to dispatch. Names that resolve to neither are
//! dropped silently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StreamError};

/// An action resolved at stream end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAction {
    /// The built-in action; its selector/payload were streamed as events
    BuiltinExecute,
    /// A registered action to dispatch
    Registered(String),
}

/// Final action name plus the merged parameters, handed to a handler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub name: String,
    pub parameters: Map<String, Value>,
}

/// A handler for one or more named actions.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Run the action with its fully merged parameters.
    /// The returned value is opaque to the pipeline.
    async fn call(&self, action: &str, parameters: Map<String, Value>) -> Result<Value>;
}

/// Adapter turning a synchronous closure into an [`ActionHandler`]
pub struct FnAction<F>(pub F);

#[async_trait]
impl<F> ActionHandler for FnAction<F>
where
    F: Fn(&str, Map<String, Value>) -> Result<Value> + Send + Sync,
{
    async fn call(&self, action: &str, parameters: Map<String, Value>) -> Result<Value> {
        (self.0)(action, parameters)
    }
}

/// Registry of dispatchable actions
#[derive(Default, Clone)]
pub struct ActionRegistry {
    by_name: HashMap<String, Arc<dyn ActionHandler>>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        self.by_name.insert(name.into(), handler);
    }

    /// Register a synchronous closure under `name`
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, Map<String, Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnAction(f)));
    }

    /// Builder-style registration
    pub fn with_action(
        mut self,
        name: impl Into<String>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        self.register(name, handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered action names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a merged action name against the built-in name and this registry.
    pub fn resolve(&self, name: &str, builtin: &str) -> Option<ResolvedAction> {
        if name == builtin {
            Some(ResolvedAction::BuiltinExecute)
        } else if self.contains(name) {
            Some(ResolvedAction::Registered(name.to_string()))
        } else {
            None
        }
    }

    /// Invoke the handler registered for `record.name`.
    ///
    /// Handler errors are returned unchanged.
    pub async fn dispatch(&self, record: ActionRecord) -> Result<Value> {
        let handler = self.by_name.get(&record.name).cloned().ok_or_else(|| {
            StreamError::dispatch(record.name.as_str(), "no handler registered")
        })?;
        tracing::debug!(action = %record.name, "dispatching action");
        handler.call(&record.name, record.parameters).await
    }
}
