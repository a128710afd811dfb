use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{self, Fields};
use super::PublishDetails;

/// Pixel dimensions, returned when `include_dimension` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub height: u64,
    pub width: u64,
}

/// One published asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct AssetModel {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub file_name: Option<String>,
    /// MIME type.
    pub content_type: Option<String>,
    pub file_size: Option<u64>,
    pub parent_uid: Option<String>,
    pub is_dir: Option<bool>,
    pub in_progress: Option<bool>,
    pub version: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub tags: Option<Vec<String>>,
    pub dimension: Option<Dimension>,
    pub publish_details: Option<PublishDetails>,
    pub fields: Fields,
}

impl AssetModel {
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            uid: fields::string(map, "uid"),
            title: fields::string(map, "title"),
            description: fields::string(map, "description"),
            url: fields::string(map, "url"),
            file_name: fields::string(map, "filename"),
            content_type: fields::string(map, "content_type"),
            file_size: file_size(map),
            parent_uid: fields::string(map, "parent_uid"),
            is_dir: fields::strict_bool(map, "is_dir"),
            in_progress: fields::strict_bool(map, "_in_progress"),
            version: fields::version(map),
            created_at: fields::timestamp(map, "created_at"),
            created_by: fields::string(map, "created_by"),
            updated_at: fields::timestamp(map, "updated_at"),
            updated_by: fields::string(map, "updated_by"),
            deleted_at: fields::timestamp(map, "deleted_at"),
            deleted_by: fields::string(map, "deleted_by"),
            tags: fields::tags(map),
            dimension: dimension(map),
            publish_details: fields::publish_details(map),
            fields: Fields::new(map.clone()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_json)
    }
}

impl Deref for AssetModel {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.fields
    }
}

// The API sends file_size as a numeric string.
fn file_size(map: &Map<String, Value>) -> Option<u64> {
    match map.get("file_size")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn dimension(map: &Map<String, Value>) -> Option<Dimension> {
    let dim = map.get("dimension")?.as_object()?;
    Some(Dimension {
        height: dim.get("height")?.as_u64()?,
        width: dim.get("width")?.as_u64()?,
    })
}
