//! Delta synchronization.
//!
//! A session starts with `init=true` (optionally narrowed by start date,
//! content type, locale and event type) and continues with whichever token
//! the previous page returned. A token request carries nothing else.

use chrono::{DateTime, Utc};

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::SyncResult;
use crate::params::{self, QueryParams};
use crate::stack::{Headers, Stack};
use crate::transport::Transport;

/// Event kinds accepted by the sync `type` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishType {
    EntryPublished,
    EntryUnpublished,
    EntryDeleted,
    AssetPublished,
    AssetUnpublished,
    AssetDeleted,
    ContentTypeDeleted,
}

impl PublishType {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishType::EntryPublished => "entry_published",
            PublishType::EntryUnpublished => "entry_unpublished",
            PublishType::EntryDeleted => "entry_deleted",
            PublishType::AssetPublished => "asset_published",
            PublishType::AssetUnpublished => "asset_unpublished",
            PublishType::AssetDeleted => "asset_deleted",
            PublishType::ContentTypeDeleted => "content_type_deleted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncRequest {
    stack: Stack,
    start_from: Option<DateTime<Utc>>,
    content_type_uid: Option<String>,
    locale: Option<String>,
    publish_type: Option<PublishType>,
    sync_token: Option<String>,
    pagination_token: Option<String>,
    headers: Headers,
}

impl SyncRequest {
    pub(crate) fn new(stack: Stack) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            start_from: None,
            content_type_uid: None,
            locale: None,
            publish_type: None,
            sync_token: None,
            pagination_token: None,
            headers,
        }
    }

    pub fn start_from(&mut self, from: DateTime<Utc>) -> &mut Self {
        self.start_from = Some(from);
        self
    }

    pub fn content_type(&mut self, uid: impl Into<String>) -> &mut Self {
        self.content_type_uid = Some(uid.into());
        self
    }

    pub fn locale(&mut self, code: impl Into<String>) -> &mut Self {
        self.locale = Some(code.into());
        self
    }

    pub fn publish_type(&mut self, kind: PublishType) -> &mut Self {
        self.publish_type = Some(kind);
        self
    }

    /// Fetch the changes made since the session that returned `token`.
    pub fn sync_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.sync_token = Some(token.into());
        self
    }

    /// Fetch the next page of the current session.
    pub fn pagination_token(&mut self, token: impl Into<String>) -> &mut Self {
        self.pagination_token = Some(token.into());
        self
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.set(key, value);
        self
    }

    pub fn remove_header(&mut self, key: &str) -> &mut Self {
        self.headers.remove(key);
        self
    }

    /// A pagination token takes precedence over a sync token; either one
    /// suppresses the `init` filters.
    pub fn build_request(&self) -> HttpRequest {
        let mut query = QueryParams::new();
        if let Some(token) = &self.pagination_token {
            query.set(params::PAGINATION_TOKEN, token);
        } else if let Some(token) = &self.sync_token {
            query.set(params::SYNC_TOKEN, token);
        } else {
            query.set(params::INIT, true);
            if let Some(from) = self.start_from {
                query.set(params::START_FROM, from.format("%Y-%m-%dT%H:%M:%S%.3fZ"));
            }
            if let Some(uid) = &self.content_type_uid {
                query.set(params::CONTENT_TYPE_UID, uid);
            }
            if let Some(locale) = &self.locale {
                query.set(params::LOCALE, locale);
            }
            if let Some(kind) = self.publish_type {
                query.set(params::PUBLISH_TYPE, kind.as_str());
            }
        }
        self.stack
            .get(&["stacks", "sync"], &self.headers, &Filter::new(), &query, false)
    }

    pub fn parse(response: HttpResponse) -> Result<SyncResult, ApiError> {
        let body = json_body(&response)?;
        Ok(SyncResult::from_response(&body))
    }

    pub fn fetch<F>(&self, transport: &dyn Transport, on_complete: F)
    where
        F: FnOnce(Result<SyncResult, CdnError>) + Send + 'static,
    {
        dispatch(transport, self.build_request(), Self::parse, on_complete);
    }
}
