//! Response shape normalization.
//!
//! Delivery responses nest the payload under a wrapper key (`entry`,
//! `entries`, `asset`, `assets`, ...) but callers also hand us bare
//! entities and bare arrays. `normalize` resolves all of these into a
//! [`Shape`] of borrowed JSON objects for the model mapper.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ShapeError;

pub type Object = Map<String, Value>;

#[derive(Debug, PartialEq)]
pub enum Shape<'a> {
    Single(&'a Object),
    Many(Vec<&'a Object>),
    Empty,
}

/// Resolve `raw` using `wrapper_key` as a hint.
///
/// If `raw` is an object holding `wrapper_key`, that value is the source;
/// otherwise `raw` itself is. Arrays yield their object elements; anything
/// that is not object-like is dropped.
pub fn normalize<'a>(raw: &'a Value, wrapper_key: &str) -> Shape<'a> {
    let source = raw.get(wrapper_key).unwrap_or(raw);
    match source {
        Value::Object(map) => Shape::Single(map),
        Value::Array(items) => Shape::Many(objects(items, wrapper_key)),
        _ => Shape::Empty,
    }
}

/// A single entity, or `None` if the payload holds no object.
pub fn single<'a>(raw: &'a Value, wrapper_key: &str) -> Option<&'a Object> {
    match normalize(raw, wrapper_key) {
        Shape::Single(map) => Some(map),
        _ => None,
    }
}

/// A collection stored under `wrapper_key`.
///
/// A missing key is the "no results" case and yields an empty list. A lone
/// object under the key counts as a one-element collection. Other value
/// types are tolerated as empty.
pub fn many<'a>(raw: &'a Value, wrapper_key: &str) -> Vec<&'a Object> {
    match raw.get(wrapper_key) {
        Some(Value::Array(items)) => objects(items, wrapper_key),
        Some(Value::Object(map)) => vec![map],
        Some(other) => {
            debug!(key = wrapper_key, kind = kind_of(other), "ignoring non-collection value");
            Vec::new()
        }
        None => match raw {
            Value::Array(items) => objects(items, wrapper_key),
            _ => Vec::new(),
        },
    }
}

/// Like [`many`], but a present non-array value is an error.
pub fn require_list<'a>(raw: &'a Value, wrapper_key: &str) -> Result<Vec<&'a Object>, ShapeError> {
    match raw.get(wrapper_key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(objects(items, wrapper_key)),
        Some(other) => Err(ShapeError::NotAList {
            field: wrapper_key.to_string(),
            found: kind_of(other),
        }),
    }
}

/// Total count for a collection response.
///
/// A numeric `count` always wins. Otherwise a numeric `fallback_key` (the
/// API answers `{"entries": 12}` to count-only queries) stands in.
pub fn count(raw: &Value, fallback_key: &str) -> Option<u64> {
    raw.get("count")
        .and_then(Value::as_u64)
        .or_else(|| raw.get(fallback_key).and_then(Value::as_u64))
}

fn objects<'a>(items: &'a [Value], key: &str) -> Vec<&'a Object> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            other => {
                debug!(key, kind = kind_of(other), "skipping non-object collection element");
                None
            }
        })
        .collect()
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_object_is_unwrapped() {
        let raw = json!({"entry": {"uid": "blt1"}});
        let map = single(&raw, "entry").unwrap();
        assert_eq!(map["uid"], "blt1");
    }

    #[test]
    fn bare_object_is_its_own_source() {
        let raw = json!({"uid": "blt1", "title": "Hello"});
        let map = single(&raw, "entry").unwrap();
        assert_eq!(map["title"], "Hello");
    }

    #[test]
    fn non_object_payload_is_empty() {
        assert_eq!(normalize(&json!("text"), "entry"), Shape::Empty);
        assert_eq!(normalize(&json!({"entry": 5}), "entry"), Shape::Empty);
        assert!(single(&json!([{"uid": "a"}]), "entry").is_none());
    }

    #[test]
    fn mixed_array_keeps_only_objects() {
        let raw = json!({"entries": [{"uid": "a"}, "junk", 3, null, {"uid": "b"}]});
        let items = many(&raw, "entries");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["uid"], "b");
    }

    #[test]
    fn missing_collection_is_empty() {
        assert!(many(&json!({"count": 0}), "entries").is_empty());
    }

    #[test]
    fn bare_array_is_a_collection() {
        let raw = json!([{"uid": "a"}, "x"]);
        assert_eq!(many(&raw, "entries").len(), 1);
        match normalize(&raw, "entries") {
            Shape::Many(items) => assert_eq!(items.len(), 1),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn require_list_rejects_every_non_array() {
        for bad in [json!("not_a_list"), json!(12345), json!(true), json!({})] {
            let raw = json!({ "assets": bad });
            let err = require_list(&raw, "assets").unwrap_err();
            assert_eq!(err.field(), "assets");
            assert!(err.to_string().contains("List or ArrayList"));
        }
    }

    #[test]
    fn require_list_accepts_missing_and_arrays() {
        assert!(require_list(&json!({}), "assets").unwrap().is_empty());
        let raw = json!({"assets": [{"uid": "a"}, 1]});
        assert_eq!(require_list(&raw, "assets").unwrap().len(), 1);
    }

    #[test]
    fn count_prefers_count_field() {
        assert_eq!(count(&json!({"count": 3, "entries": 9}), "entries"), Some(3));
        assert_eq!(count(&json!({"count": 3, "entries": []}), "entries"), Some(3));
    }

    #[test]
    fn count_falls_back_to_numeric_field() {
        assert_eq!(count(&json!({"entries": 12}), "entries"), Some(12));
        assert_eq!(count(&json!({"count": "x", "objects": 4}), "objects"), Some(4));
        assert_eq!(count(&json!({"entries": []}), "entries"), None);
    }
}
