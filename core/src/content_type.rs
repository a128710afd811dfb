//! Content type fetch and listing.

use serde_json::Map;

use crate::dispatch::{dispatch, json_body};
use crate::entry::Entry;
use crate::error::{ApiError, CdnError, ConfigError};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{ContentTypeCollection, ContentTypeModel};
use crate::normalize;
use crate::params::{self, QueryParams};
use crate::query::Query;
use crate::stack::{include_flags, request_overrides, require, Headers, Stack};
use crate::transport::Transport;

/// One content type: fetches its schema and scopes entry builders.
#[derive(Debug, Clone)]
pub struct ContentType {
    stack: Stack,
    uid: String,
    params: QueryParams,
    headers: Headers,
}

impl ContentType {
    pub(crate) fn new(stack: Stack, uid: String) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            uid,
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn entry(&self, uid: impl Into<String>) -> Entry {
        Entry::new(self.stack.clone(), self.uid.clone(), uid.into())
    }

    pub fn query(&self) -> Query {
        Query::new(self.stack.clone(), self.uid.clone())
    }

    pub fn build_request(&self) -> Result<HttpRequest, ConfigError> {
        require(&self.uid, "content type uid")?;
        Ok(self.stack.get(
            &["content_types", &self.uid],
            &self.headers,
            &Filter::new(),
            &self.params,
            false,
        ))
    }

    /// A payload with no content type object yields an empty model.
    pub fn parse(response: HttpResponse) -> Result<ContentTypeModel, ApiError> {
        let body = json_body(&response)?;
        let empty = Map::new();
        Ok(ContentTypeModel::from_json(
            normalize::single(&body, "content_type").unwrap_or(&empty),
        ))
    }

    pub fn fetch<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<ContentTypeModel, CdnError>) + Send + 'static,
    {
        let request = self.build_request()?;
        dispatch(transport, request, Self::parse, on_complete);
        Ok(())
    }
}

/// Listing of every content type in the stack.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    stack: Stack,
    params: QueryParams,
    headers: Headers,
}

impl ContentTypes {
    pub(crate) fn new(stack: Stack) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.params.set(params::LIMIT, limit);
        self
    }

    pub fn skip(&mut self, skip: u32) -> &mut Self {
        self.params.set(params::SKIP, skip);
        self
    }

    pub fn build_request(&self) -> HttpRequest {
        self.stack
            .get(&["content_types"], &self.headers, &Filter::new(), &self.params, false)
    }

    pub fn parse(response: HttpResponse) -> Result<ContentTypeCollection, ApiError> {
        let body = json_body(&response)?;
        Ok(ContentTypeCollection::from_response(&body))
    }

    pub fn find<F>(&self, transport: &dyn Transport, on_complete: F)
    where
        F: FnOnce(Result<ContentTypeCollection, CdnError>) + Send + 'static,
    {
        dispatch(transport, self.build_request(), Self::parse, on_complete);
    }
}

request_overrides!(ContentType, ContentTypes);

include_flags!(ContentType {
    include_global_field_schema => params::INCLUDE_GLOBAL_FIELD_SCHEMA,
    include_branch => params::INCLUDE_BRANCH,
});

include_flags!(ContentTypes {
    include_count => params::INCLUDE_COUNT,
    include_global_field_schema => params::INCLUDE_GLOBAL_FIELD_SCHEMA,
    include_branch => params::INCLUDE_BRANCH,
});
