use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{self, Fields};

/// A content type schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct ContentTypeModel {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: i64,
    pub schema: Vec<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: Fields,
}

impl ContentTypeModel {
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            uid: fields::string(map, "uid"),
            title: fields::string(map, "title"),
            description: fields::string(map, "description"),
            version: fields::version(map),
            schema: schema(map),
            created_at: fields::timestamp(map, "created_at"),
            updated_at: fields::timestamp(map, "updated_at"),
            fields: Fields::new(map.clone()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_json)
    }

    /// Schema field definition with the given `uid`.
    pub fn schema_field(&self, uid: &str) -> Option<&Value> {
        find_field(&self.schema, uid)
    }
}

/// A reusable global field schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct GlobalFieldModel {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub version: i64,
    pub schema: Vec<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fields: Fields,
}

impl GlobalFieldModel {
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            uid: fields::string(map, "uid"),
            title: fields::string(map, "title"),
            description: fields::string(map, "description"),
            version: fields::version(map),
            schema: schema(map),
            created_at: fields::timestamp(map, "created_at"),
            updated_at: fields::timestamp(map, "updated_at"),
            fields: Fields::new(map.clone()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_json)
    }

    pub fn schema_field(&self, uid: &str) -> Option<&Value> {
        find_field(&self.schema, uid)
    }
}

fn schema(map: &Map<String, Value>) -> Vec<Value> {
    map.get("schema")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn find_field<'a>(schema: &'a [Value], uid: &str) -> Option<&'a Value> {
    schema
        .iter()
        .find(|field| field.get("uid").and_then(Value::as_str) == Some(uid))
}
