//! Ordering and reconstruction properties over arbitrary chunkings

use codestream::streaming::{StreamEvent, StreamSession, merge_deltas, try_parse};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn call(fragment: Value) -> Value {
    json!({"choices": [{"delta": {"function_call": fragment}}]})
}

/// Split `s` at the given char offsets
fn split(s: &str, mut cuts: Vec<usize>) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    cuts.iter_mut().for_each(|c| *c = (*c).min(chars.len()));
    cuts.push(0);
    cuts.push(chars.len());
    cuts.sort_unstable();
    cuts.windows(2)
        .map(|w| chars[w[0]..w[1]].iter().collect())
        .collect()
}

/// Stream `arguments` in pieces, announcing the action name before piece `name_at`
fn stream_events(arguments: &str, cuts: Vec<usize>, name_at: usize) -> Vec<StreamEvent> {
    let mut session = StreamSession::default();
    let mut events = Vec::new();
    let mut announced = false;
    for (i, piece) in split(arguments, cuts).into_iter().enumerate() {
        if i == name_at {
            events.extend(session.process_chunk(call(json!({"name": "execute"}))));
            announced = true;
        }
        events.extend(session.process_chunk(call(json!({"arguments": piece}))));
    }
    if !announced {
        events.extend(session.process_chunk(call(json!({"name": "execute"}))));
    }
    events.extend(session.finish().trailing);
    events
}

/// Serialized arguments with the selector ahead of the payload
fn arguments(language: &str, code: &str) -> String {
    format!(
        "{{\"language\":{},\"code\":{}}}",
        Value::from(language),
        Value::from(code)
    )
}

fn code_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9 ()=+.;]{0,40}",
        "[ -~\n\t]{0,40}",
        ".{0,20}",
    ]
}

fn language_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,10}"
}

/// Any JSON value a model might put next to the code: floats with
/// exponents, booleans, nulls and shallow containers
fn parameter_strategy() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        Just(Value::Null),
        "[a-z ]{0,8}".prop_map(Value::from),
    ];
    scalar.prop_recursive(2, 10, 3, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            proptest::collection::btree_map("[a-z]{1,4}", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn payload_fragments_reconstruct_the_code(
        language in language_strategy(),
        code in code_strategy(),
        cuts in proptest::collection::vec(0usize..120, 0..12),
        name_at in 0usize..14,
    ) {
        let events = stream_events(&arguments(&language, &code), cuts, name_at);

        let selectors: Vec<&StreamEvent> = events.iter().filter(|e| e.is_selector_ready()).collect();
        prop_assert_eq!(selectors.len(), 1);
        prop_assert_eq!(selectors[0], &StreamEvent::selector_ready(language.as_str()));

        let reconstructed: String = events.iter().filter_map(StreamEvent::payload_text).collect();
        prop_assert_eq!(reconstructed, code);
    }

    #[test]
    fn payload_never_precedes_selector(
        language in language_strategy(),
        code in code_strategy(),
        cuts in proptest::collection::vec(0usize..120, 0..12),
        name_at in 0usize..14,
    ) {
        let events = stream_events(&arguments(&language, &code), cuts, name_at);

        let first_selector = events.iter().position(StreamEvent::is_selector_ready);
        let first_payload = events.iter().position(|e| e.payload_text().is_some());
        if let Some(payload) = first_payload {
            prop_assert!(first_selector.is_some_and(|selector| selector < payload));
        }
    }

    #[test]
    fn recognized_keys_only_grow(
        language in language_strategy(),
        code in code_strategy(),
        extra in proptest::collection::vec(("[a-z]{1,6}", parameter_strategy()), 0..4),
    ) {
        let mut target = Map::new();
        target.insert("language".into(), json!(language));
        target.insert("code".into(), json!(code));
        for (key, value) in extra {
            target.entry(key).or_insert(value);
        }
        let expected = target.len();
        let serialized = Value::Object(target).to_string();

        let mut seen: Vec<String> = Vec::new();
        let mut buffer = String::new();
        for c in serialized.chars() {
            buffer.push(c);
            let keys: Vec<String> = try_parse(&buffer)
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            for key in &seen {
                prop_assert!(keys.contains(key), "key {} lost at prefix {:?}", key, buffer);
            }
            seen = keys;
        }
        prop_assert_eq!(seen.len(), expected);
    }

    #[test]
    fn numeric_parameters_survive_every_prefix(
        number in any::<f64>().prop_filter("finite", |f| f.is_finite()),
    ) {
        let serialized = json!({"language": "python", "ratio": number}).to_string();
        let mut recognized = false;
        for end in 1..=serialized.len() {
            let Some(parsed) = try_parse(&serialized[..end]) else {
                continue;
            };
            if recognized {
                prop_assert!(parsed.contains_key("ratio"), "ratio lost at {:?}", &serialized[..end]);
            }
            recognized |= parsed.contains_key("ratio");
        }
        prop_assert!(recognized);
    }

    #[test]
    fn repeated_deltas_are_idempotent(code in "[a-z ]{1,20}") {
        let mut session = StreamSession::default();
        session.process_chunk(call(json!({"name": "execute", "arguments": arguments("sh", &code)})));
        session.process_chunk(call(json!({"arguments": ""})));
        let again = session.process_chunk(call(json!({"arguments": ""})));
        prop_assert!(again.is_empty());
        prop_assert!(session.finish().trailing.is_empty());
    }
}

#[test]
fn hello_world_merges_from_three_fragments() {
    let mut state = Map::new();
    for piece in ["he", "llo ", "world"] {
        state = merge_deltas(state, json!({"content": piece}).as_object().cloned().unwrap());
    }
    assert_eq!(state["content"], "hello world");
}
