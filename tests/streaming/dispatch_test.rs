//! End-of-stream resolution and dispatch of registered actions

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use codestream::prelude::*;
use futures::{StreamExt, stream};
use serde_json::{Map, Value, json};

fn call(fragment: Value) -> Result<Value> {
    Ok(json!({"choices": [{"index": 0, "delta": {"function_call": fragment}}]}))
}

/// Handler that records how often it ran and echoes its parameters back
#[derive(Default)]
struct EchoHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl ActionHandler for EchoHandler {
    async fn call(&self, action: &str, parameters: Map<String, Value>) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(json!({"action": action, "echo": parameters}))
    }
}

struct FailingHandler;

#[async_trait]
impl ActionHandler for FailingHandler {
    async fn call(&self, action: &str, _parameters: Map<String, Value>) -> Result<Value> {
        Err(StreamError::dispatch(action, "backend unavailable"))
    }
}

#[tokio::test]
async fn registered_action_dispatches_with_merged_parameters() {
    let handler = Arc::new(EchoHandler::default());
    let registry = ActionRegistry::new().with_action("lookup", handler.clone());
    let mailbox = OutputMailbox::new();
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), mailbox.clone());

    let chunks = vec![
        call(json!({"name": "look"})),
        call(json!({"name": "up", "arguments": "{\"city\":\"Par"})),
        call(json!({"arguments": "is\",\"units\":\"metric\"}"})),
    ];
    let events: Vec<StreamEvent> = driver
        .run(stream::iter(chunks))
        .map(|e| e.expect("no stream error"))
        .collect()
        .await;

    let parameters = json!({"city": "Paris", "units": "metric"});
    let expected_output = json!({"action": "lookup", "echo": parameters});
    assert_eq!(
        events,
        vec![
            StreamEvent::DispatchRequest {
                action: "lookup".into(),
                parameters: parameters.as_object().cloned().unwrap(),
            },
            StreamEvent::Output {
                value: expected_output.clone(),
            },
        ]
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

    // The mailbox hands the output over exactly once
    assert_eq!(mailbox.take().await, Some(expected_output));
    assert_eq!(mailbox.take().await, None);
}

#[tokio::test]
async fn unknown_action_produces_no_dispatch() {
    let handler = Arc::new(EchoHandler::default());
    let registry = ActionRegistry::new().with_action("lookup", handler.clone());
    let mailbox = OutputMailbox::new();
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), mailbox.clone());

    let chunks = vec![call(json!({"name": "format_disk", "arguments": "{\"device\":\"sda\"}"}))];
    let events: Vec<Result<StreamEvent>> = driver.run(stream::iter(chunks)).collect().await;

    assert!(events.is_empty());
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    assert!(mailbox.is_empty().await);
}

#[tokio::test]
async fn builtin_action_is_never_dispatched() {
    let handler = Arc::new(EchoHandler::default());
    // Even a handler registered under the built-in name is not called
    let registry = ActionRegistry::new().with_action("execute", handler.clone());
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), OutputMailbox::new());

    let chunks = vec![call(json!({
        "name": "execute",
        "arguments": "{\"language\":\"python\",\"code\":\"1+1\"}"
    }))];
    let events: Vec<StreamEvent> = driver
        .run(stream::iter(chunks))
        .map(|e| e.expect("no stream error"))
        .collect()
        .await;

    assert_eq!(
        events,
        vec![
            StreamEvent::selector_ready("python"),
            StreamEvent::payload_delta("1+1"),
        ]
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dispatch_failure_propagates_to_the_caller() {
    let registry = ActionRegistry::new().with_action("lookup", Arc::new(FailingHandler));
    let mailbox = OutputMailbox::new();
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), mailbox.clone());

    let chunks = vec![call(json!({"name": "lookup", "arguments": "{}"}))];
    let events: Vec<Result<StreamEvent>> = driver.run(stream::iter(chunks)).collect().await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Ok(StreamEvent::DispatchRequest { .. })));
    let err = events[1].clone().unwrap_err();
    assert!(err.is_dispatch_error());
    assert_eq!(err, StreamError::dispatch("lookup", "backend unavailable"));
    assert!(mailbox.is_empty().await);
}

#[tokio::test]
async fn last_legible_parameters_are_dispatched() {
    let handler = Arc::new(EchoHandler::default());
    let registry = ActionRegistry::new().with_action("lookup", handler);
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), OutputMailbox::new());

    // The final buffer has a stray closer and no longer parses
    let chunks = vec![
        call(json!({"name": "lookup", "arguments": "{\"city\":\"Oslo\"}"})),
        call(json!({"arguments": "]"})),
    ];
    let events: Vec<Result<StreamEvent>> = driver.run(stream::iter(chunks)).collect().await;

    let Ok(StreamEvent::DispatchRequest { parameters, .. }) = &events[0] else {
        panic!("expected a dispatch request, got {events:?}");
    };
    assert_eq!(parameters.get("city"), Some(&json!("Oslo")));
}

#[tokio::test]
async fn sequential_streams_share_one_mailbox() {
    let mut registry = ActionRegistry::new();
    registry.register_fn("count", |_, params| Ok(params["n"].clone()));
    let mailbox = OutputMailbox::new();
    let driver = StreamDriver::new(ExtractionConfig::default(), Arc::new(registry), mailbox.clone());

    for n in 1..=2 {
        let arguments = format!("{{\"n\":{n}}}");
        let chunks = vec![call(json!({"name": "count", "arguments": arguments}))];
        let _: Vec<Result<StreamEvent>> = driver.run(stream::iter(chunks)).collect().await;
    }
    // Unread output is overwritten by the next stream
    assert_eq!(mailbox.take().await, Some(json!(2)));
}
