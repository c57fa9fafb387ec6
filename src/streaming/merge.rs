//! Delta Merger
//!
//! Folds streamed delta fragments into one cumulative JSON object. String
//! leaves are concatenated in arrival order (token-by-token text), nested
//! objects merge recursively, and anything else is replaced by the newer value.

use serde_json::{Map, Value};

/// Merge `delta` into `accumulated` and return the combined state.
///
/// Both maps are taken by value so callers never alias a half-merged state.
/// Rules per key of `delta`:
/// - absent in `accumulated`: inserted as-is
/// - string + string: concatenated
/// - string + number: the number is rendered and appended (ids can stream digits)
/// - object + object: merged recursively
/// - `null` over an existing value: ignored
/// - any other pair: the delta value replaces the accumulated one
pub fn merge_deltas(
    mut accumulated: Map<String, Value>,
    delta: Map<String, Value>,
) -> Map<String, Value> {
    for (key, incoming) in delta {
        match accumulated.get_mut(&key) {
            Some(existing) => merge_value(existing, incoming),
            None => {
                accumulated.insert(key, incoming);
            }
        }
    }
    accumulated
}

/// Merge one incoming delta value into an existing accumulated value in place.
pub fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (_, Value::Null) => {}
        (Value::String(acc), Value::String(fragment)) => acc.push_str(&fragment),
        (Value::String(acc), Value::Number(n)) => acc.push_str(&n.to_string()),
        (Value::Object(acc), Value::Object(fragment)) => {
            for (key, value) in fragment {
                match acc.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        acc.insert(key, value);
                    }
                }
            }
        }
        (slot, replacement) => *slot = replacement,
    }
}
