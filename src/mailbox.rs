use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Single-slot hand-off for the output of a dispatched action
///
/// The stream driver stores the dispatch result here and the next consumer
/// takes it exactly once. It is not a queue: a second store before a take
/// overwrites the first. Clones share the same slot, so streams sharing one
/// mailbox must be run one after another.
#[derive(Clone, Default, Debug)]
pub struct OutputMailbox {
    slot: Arc<Mutex<Option<Value>>>,
}

impl OutputMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the unread value it replaced (if any)
    pub async fn store(&self, value: Value) -> Option<Value> {
        let mut slot = self.slot.lock().await;
        let previous = slot.replace(value);
        if previous.is_some() {
            tracing::debug!("mailbox value overwritten before it was read");
        }
        previous
    }

    /// Take the stored value and clear the slot
    pub async fn take(&self) -> Option<Value> {
        self.slot.lock().await.take()
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.lock().await.is_none()
    }
}
