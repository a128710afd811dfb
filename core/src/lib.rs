//! Client core for a headless content-delivery API.
//!
//! # Overview
//! Builders accumulate filters and parameters, produce `HttpRequest` values,
//! and parse `HttpResponse` values into typed models without touching the
//! network (host-does-IO pattern). A caller-supplied [`Transport`] performs
//! the round-trip; the builders' `fetch`/`find` methods wire a transport, a
//! parser and a completion callback together.
//!
//! # Design
//! - `Stack` holds only the shared `StackConfig`; every other builder comes
//!   from a factory method on it and owns its own state.
//! - Filters are insertion-ordered JSON maps. Setting a predicate on a field
//!   replaces the previous one.
//! - Response payloads may or may not be wrapped under a key such as
//!   `entry` or `assets`; `normalize` hides the difference.
//! - Models keep their raw JSON as `Fields` for caller-defined keys.

pub mod asset;
pub mod config;
pub mod content_type;
pub mod dispatch;
pub mod entry;
pub mod error;
pub mod filter;
pub mod global_field;
pub mod http;
pub mod model;
pub mod normalize;
pub mod params;
pub mod query;
pub mod stack;
pub mod sync;
pub mod taxonomy;
pub mod transport;

pub use asset::{Asset, AssetLibrary, SortOrder};
pub use config::StackConfig;
pub use content_type::{ContentType, ContentTypes};
pub use dispatch::Completion;
pub use entry::Entry;
pub use error::{ApiError, CdnError, ConfigError, ErrorKind, ShapeError};
pub use filter::Filter;
pub use global_field::{GlobalField, GlobalFields};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use model::{
    AssetCollection, AssetModel, ContentTypeCollection, ContentTypeModel, EntryCollection, EntryModel, Fields,
    GlobalFieldCollection, GlobalFieldModel, Group, PublishDetails, SyncItem, SyncResult,
};
pub use query::Query;
pub use stack::Stack;
pub use sync::{PublishType, SyncRequest};
pub use taxonomy::Taxonomy;
pub use transport::{Responder, Transport};
