use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{self, Fields};
use super::PublishDetails;

/// One published entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct EntryModel {
    pub uid: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub locale: Option<String>,
    /// Same value as `locale`.
    pub language: Option<String>,
    pub version: i64,
    pub content_type_uid: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub tags: Option<Vec<String>>,
    pub publish_details: Option<PublishDetails>,
    pub fields: Fields,
}

impl EntryModel {
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let locale = fields::string(map, "locale");
        Self {
            uid: fields::string(map, "uid"),
            title: fields::string(map, "title"),
            url: fields::string(map, "url"),
            language: locale.clone(),
            locale,
            version: fields::version(map),
            content_type_uid: fields::string(map, "_content_type_uid"),
            created_at: fields::timestamp(map, "created_at"),
            created_by: fields::string(map, "created_by"),
            updated_at: fields::timestamp(map, "updated_at"),
            updated_by: fields::string(map, "updated_by"),
            deleted_at: fields::timestamp(map, "deleted_at"),
            deleted_by: fields::string(map, "deleted_by"),
            tags: fields::tags(map),
            publish_details: fields::publish_details(map),
            fields: Fields::new(map.clone()),
        }
    }

    /// Map a JSON value, `None` unless it is an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_json)
    }
}

impl Deref for EntryModel {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.fields
    }
}
