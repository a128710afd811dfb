use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::fields::{self, Fields};
use super::{AssetModel, EntryModel};
use crate::normalize;

/// One change reported by the sync endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct SyncItem {
    /// Wire value of the event, e.g. `entry_published`.
    pub kind: Option<String>,
    pub content_type_uid: Option<String>,
    pub event_at: Option<DateTime<Utc>>,
    pub data: Fields,
}

impl SyncItem {
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self {
            kind: fields::string(map, "type"),
            content_type_uid: fields::string(map, "content_type_uid"),
            event_at: fields::timestamp(map, "event_at"),
            data: map
                .get("data")
                .and_then(Value::as_object)
                .cloned()
                .map(Fields::new)
                .unwrap_or_default(),
        }
    }

    pub fn is_asset(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.starts_with("asset_"))
    }

    /// The payload mapped as an entry, for entry events.
    pub fn entry(&self) -> Option<EntryModel> {
        match self.kind.as_deref() {
            Some(k) if k.starts_with("entry_") => Some(EntryModel::from_json(self.data.as_map())),
            _ => None,
        }
    }

    /// The payload mapped as an asset, for asset events.
    pub fn asset(&self) -> Option<AssetModel> {
        self.is_asset()
            .then(|| AssetModel::from_json(self.data.as_map()))
    }
}

/// One page of a sync session.
///
/// Exactly one of `sync_token` (session complete, store it for the next
/// delta) or `pagination_token` (more pages follow) is normally present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct SyncResult {
    pub items: Vec<SyncItem>,
    pub sync_token: Option<String>,
    pub pagination_token: Option<String>,
    pub total_count: Option<u64>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl SyncResult {
    pub fn from_response(raw: &Value) -> Self {
        let number = |key: &str| raw.get(key).and_then(Value::as_u64);
        let token = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            items: normalize::many(raw, "items")
                .into_iter()
                .map(SyncItem::from_json)
                .collect(),
            sync_token: token("sync_token"),
            pagination_token: token("pagination_token"),
            total_count: number("total_count"),
            skip: number("skip"),
            limit: number("limit"),
        }
    }

    pub fn has_more(&self) -> bool {
        self.pagination_token.is_some()
    }
}
