//! Typed models mapped from normalized JSON entities.
//!
//! # Design
//! Mapping never fails on a missing or mistyped optional field: scalars
//! become `None`, `_version` becomes 1. Every model keeps the complete source
//! object in a [`Fields`] store so caller-defined schema fields stay
//! reachable by key. Models are `#[non_exhaustive]`: they can be read and
//! cloned freely but only the mappers construct them.

mod asset;
mod collection;
mod content_type;
mod entry;
mod fields;
mod sync;

use serde::Serialize;

pub use asset::{AssetModel, Dimension};
pub use collection::{AssetCollection, ContentTypeCollection, EntryCollection, GlobalFieldCollection};
pub use content_type::{ContentTypeModel, GlobalFieldModel};
pub use entry::EntryModel;
pub use fields::{Fields, Group};
pub use sync::{SyncItem, SyncResult};

/// Where and when an entity was last published.
///
/// An entity carries `Some(PublishDetails)` whenever its source had a
/// `publish_details` key, even if that value could not be read; the three
/// fields are then all `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishDetails {
    pub environment: Option<String>,
    pub time: Option<String>,
    pub user: Option<String>,
}
