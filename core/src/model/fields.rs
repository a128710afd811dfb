//! Raw JSON backing store for caller-defined fields, plus the extraction
//! helpers the mappers share.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::{AssetModel, EntryModel, PublishDetails};

/// Every field of an entity exactly as received, accessed by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Only a JSON boolean counts; `"true"` is not coerced.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Value at an RFC 6901 JSON pointer, e.g. `/seo/meta_title`. Segments
    /// use `~1` for `/` and `~0` for `~`. The empty pointer has no value
    /// because `Fields` is not itself a `Value`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let (head, tail) = match rest.find('/') {
            Some(at) => rest.split_at(at),
            None => (rest, ""),
        };
        let key = head.replace("~1", "/").replace("~0", "~");
        self.0.get(&key)?.pointer(tail)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// A file field holding one asset.
    pub fn asset(&self, key: &str) -> Option<AssetModel> {
        self.get_object(key).map(AssetModel::from_json)
    }

    /// A multiple-file field. Non-object elements are skipped.
    pub fn assets(&self, key: &str) -> Vec<AssetModel> {
        objects(self.get(key)).map(AssetModel::from_json).collect()
    }

    /// A group field.
    pub fn group(&self, key: &str) -> Option<Group> {
        self.get_object(key).map(|map| Group(Fields(map.clone())))
    }

    /// A multiple group field. Non-object elements are skipped.
    pub fn groups(&self, key: &str) -> Vec<Group> {
        objects(self.get(key))
            .map(|map| Group(Fields(map.clone())))
            .collect()
    }

    /// Entries resolved into a reference field via `include_reference`.
    ///
    /// Unresolved references (`{"uid": .., "_content_type_uid": ..}`) map to
    /// entries carrying only those two fields.
    pub fn entries(&self, key: &str) -> Vec<EntryModel> {
        objects(self.get(key)).map(EntryModel::from_json).collect()
    }
}

/// A group field: a nested bag of fields with the same accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Group(Fields);

impl Deref for Group {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.0
    }
}

/// Object elements of an array value, or the value itself if it is a lone
/// object.
fn objects(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    let items: Vec<&Map<String, Value>> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        Some(Value::Object(map)) => vec![map],
        _ => Vec::new(),
    };
    items.into_iter()
}

pub(crate) fn string(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn strict_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key) {
        Some(Value::Bool(b)) => Some(*b),
        _ => None,
    }
}

pub(crate) fn timestamp(map: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let raw = map.get(key)?.as_str()?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(err) => {
            debug!(key, raw, %err, "unparseable timestamp");
            None
        }
    }
}

/// Present, array-shaped and non-empty; an empty array is "no tags".
pub(crate) fn tags(map: &Map<String, Value>) -> Option<Vec<String>> {
    let items = map.get("tags")?.as_array()?;
    if items.is_empty() {
        return None;
    }
    Some(
        items
            .iter()
            .map(|tag| match tag {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

pub(crate) fn version(map: &Map<String, Value>) -> i64 {
    map.get("_version").and_then(Value::as_i64).unwrap_or(1)
}

/// `None` when the key is absent. When present, the container exists even
/// if the value is not an object, with every field left empty.
pub(crate) fn publish_details(map: &Map<String, Value>) -> Option<PublishDetails> {
    let raw = map.get("publish_details")?;
    let mut details = PublishDetails::default();
    match raw {
        Value::Object(inner) => {
            details.environment = string(inner, "environment");
            details.time = string(inner, "time");
            details.user = string(inner, "user");
        }
        other => {
            debug!(kind = crate::normalize::kind_of(other), "publish_details is not an object");
        }
    }
    Some(details)
}
