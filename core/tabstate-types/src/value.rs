//! Helpers for JSON state values.

use serde_json::{Map, Value};

/// A JSON-serializable state value.
pub type StateValue = Value;

/// Returns the empty state, `{}`.
pub fn empty_state() -> StateValue {
    Value::Object(Map::new())
}

/// Shallow merge with `overlay` taking precedence, like `{ ...base, ...overlay }`.
///
/// The result is always an object. Each side contributes its members the way
/// an object spread does: arrays and strings by index (`"0"`, `"1"`, ...),
/// `null`, booleans and numbers not at all.
pub fn shallow_merge(base: &StateValue, overlay: &StateValue) -> StateValue {
    let mut merged = Map::new();
    spread_into(&mut merged, base);
    spread_into(&mut merged, overlay);
    Value::Object(merged)
}

fn spread_into(target: &mut Map<String, Value>, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, member) in map {
                target.insert(key.clone(), member.clone());
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                target.insert(index.to_string(), item.clone());
            }
        }
        Value::String(text) => {
            for (index, ch) in text.chars().enumerate() {
                target.insert(index.to_string(), Value::String(ch.to_string()));
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
