//! Collection responses: a list of models plus the optional total count.

use serde::Serialize;
use serde_json::Value;

use super::{AssetModel, ContentTypeModel, EntryModel, GlobalFieldModel};
use crate::error::ShapeError;
use crate::normalize;

/// Result of an entry query or a taxonomy query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct EntryCollection {
    pub entries: Vec<EntryModel>,
    pub count: Option<u64>,
    /// Present when the query asked for `include_content_type`.
    pub content_type: Option<ContentTypeModel>,
}

impl EntryCollection {
    pub fn from_response(raw: &Value) -> Self {
        Self {
            entries: normalize::many(raw, "entries")
                .into_iter()
                .map(EntryModel::from_json)
                .collect(),
            count: normalize::count(raw, "entries"),
            content_type: raw.get("content_type").and_then(ContentTypeModel::from_value),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of an asset library fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct AssetCollection {
    pub assets: Vec<AssetModel>,
    pub count: Option<u64>,
}

impl AssetCollection {
    /// `assets` must be an array when present.
    pub fn from_response(raw: &Value) -> Result<Self, ShapeError> {
        let assets = normalize::require_list(raw, "assets")?
            .into_iter()
            .map(AssetModel::from_json)
            .collect();
        Ok(Self {
            assets,
            count: normalize::count(raw, "objects"),
        })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct ContentTypeCollection {
    pub content_types: Vec<ContentTypeModel>,
    pub count: Option<u64>,
}

impl ContentTypeCollection {
    pub fn from_response(raw: &Value) -> Self {
        Self {
            content_types: normalize::many(raw, "content_types")
                .into_iter()
                .map(ContentTypeModel::from_json)
                .collect(),
            count: normalize::count(raw, "objects"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[non_exhaustive]
pub struct GlobalFieldCollection {
    pub global_fields: Vec<GlobalFieldModel>,
    pub count: Option<u64>,
}

impl GlobalFieldCollection {
    pub fn from_response(raw: &Value) -> Self {
        Self {
            global_fields: normalize::many(raw, "global_fields")
                .into_iter()
                .map(GlobalFieldModel::from_json)
                .collect(),
            count: normalize::count(raw, "objects"),
        }
    }
}
