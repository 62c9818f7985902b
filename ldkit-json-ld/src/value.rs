//! Shape predicates and small helpers over expanded JSON-LD values

use serde_json::{Map, Value as JsonValue};

/// Wrap a value in an array unless it already is one. Null becomes empty.
pub fn as_array(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

/// Remove the map stored under `key`, or start a new one.
pub fn take_object(map: &mut Map<String, JsonValue>, key: &str) -> Map<String, JsonValue> {
    match map.remove(key) {
        Some(JsonValue::Object(inner)) => inner,
        _ => Map::new(),
    }
}

/// Borrowing form of [`as_array`].
pub fn as_slice(value: &JsonValue) -> &[JsonValue] {
    match value {
        JsonValue::Array(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    }
}

pub fn is_scalar(value: &JsonValue) -> bool {
    matches!(
        value,
        JsonValue::String(_) | JsonValue::Number(_) | JsonValue::Bool(_)
    )
}

pub fn is_value_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|m| m.contains_key("@value"))
}

pub fn is_list_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|m| m.contains_key("@list"))
}

/// A map with `@graph` and at most `@id`, `@index` and `@context` besides.
pub fn is_graph_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|m| {
        m.contains_key("@graph")
            && m
                .keys()
                .all(|k| matches!(k.as_str(), "@graph" | "@id" | "@index" | "@context"))
    })
}

/// A graph object without an `@id`.
pub fn is_simple_graph_object(value: &JsonValue) -> bool {
    is_graph_object(value) && value.get("@id").is_none()
}

/// A node object: a map that is not a value, list, set or graph object.
pub fn is_node_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|m| {
        !m.contains_key("@value")
            && !m.contains_key("@list")
            && !m.contains_key("@set")
            && !(is_graph_object(value) && !m.contains_key("@id"))
    })
}

/// A map holding only `@id`.
pub fn is_node_reference(value: &JsonValue) -> bool {
    value
        .as_object()
        .is_some_and(|m| m.len() == 1 && m.contains_key("@id"))
}

pub fn is_blank_node_object(value: &JsonValue) -> bool {
    match value.as_object() {
        Some(m) => match m.get("@id") {
            Some(JsonValue::String(id)) => id.starts_with("_:"),
            Some(_) => false,
            None => !m.contains_key("@value") && !m.contains_key("@list") && !m.contains_key("@set"),
        },
        None => false,
    }
}

pub fn is_empty_object(value: &JsonValue) -> bool {
    value.as_object().is_some_and(|m| m.is_empty())
}

/// Append `value` to the entry `key` of `map`.
///
/// With `as_array` the entry is always an array; arrays are spliced in.
pub fn add_value(map: &mut Map<String, JsonValue>, key: &str, value: JsonValue, as_array: bool) {
    if let JsonValue::Array(items) = value {
        if items.is_empty() && as_array {
            map.entry(key.to_string())
                .or_insert_with(|| JsonValue::Array(Vec::new()));
        }
        for item in items {
            add_value(map, key, item, as_array);
        }
        return;
    }

    match map.get_mut(key) {
        Some(JsonValue::Array(existing)) => existing.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = JsonValue::Array(vec![previous, value]);
        }
        None => {
            let value = if as_array {
                JsonValue::Array(vec![value])
            } else {
                value
            };
            map.insert(key.to_string(), value);
        }
    }
}

/// Entries of a map, sorted by key when `ordered`.
pub fn entries(map: &Map<String, JsonValue>, ordered: bool) -> Vec<(&String, &JsonValue)> {
    let mut entries: Vec<_> = map.iter().collect();
    if ordered {
        entries.sort_by(|a, b| a.0.cmp(b.0));
    }
    entries
}
