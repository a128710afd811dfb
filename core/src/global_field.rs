//! Global field fetch and listing.

use serde_json::Map;

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError, ConfigError};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{GlobalFieldCollection, GlobalFieldModel};
use crate::normalize;
use crate::params::{self, QueryParams};
use crate::stack::{include_flags, request_overrides, require, Headers, Stack};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct GlobalField {
    stack: Stack,
    uid: String,
    params: QueryParams,
    headers: Headers,
}

impl GlobalField {
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

    pub fn build_request(&self) -> Result<HttpRequest, ConfigError> {
        require(&self.uid, "global field uid")?;
        Ok(self.stack.get(
            &["global_fields", &self.uid],
            &self.headers,
            &Filter::new(),
            &self.params,
            false,
        ))
    }

    /// A payload with no global field object yields an empty model.
    pub fn parse(response: HttpResponse) -> Result<GlobalFieldModel, ApiError> {
        let body = json_body(&response)?;
        let empty = Map::new();
        Ok(GlobalFieldModel::from_json(
            normalize::single(&body, "global_field").unwrap_or(&empty),
        ))
    }

    pub fn fetch<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<GlobalFieldModel, CdnError>) + Send + 'static,
    {
        let request = self.build_request()?;
        dispatch(transport, request, Self::parse, on_complete);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GlobalFields {
    stack: Stack,
    params: QueryParams,
    headers: Headers,
}

impl GlobalFields {
    pub(crate) fn new(stack: Stack) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn build_request(&self) -> HttpRequest {
        self.stack
            .get(&["global_fields"], &self.headers, &Filter::new(), &self.params, false)
    }

    pub fn parse(response: HttpResponse) -> Result<GlobalFieldCollection, ApiError> {
        let body = json_body(&response)?;
        Ok(GlobalFieldCollection::from_response(&body))
    }

    pub fn find<F>(&self, transport: &dyn Transport, on_complete: F)
    where
        F: FnOnce(Result<GlobalFieldCollection, CdnError>) + Send + 'static,
    {
        dispatch(transport, self.build_request(), Self::parse, on_complete);
    }
}

request_overrides!(GlobalField, GlobalFields);

include_flags!(GlobalField {
    include_branch => params::INCLUDE_BRANCH,
    include_global_field_schema => params::INCLUDE_GLOBAL_FIELD_SCHEMA,
});

include_flags!(GlobalFields {
    include_count => params::INCLUDE_COUNT,
    include_branch => params::INCLUDE_BRANCH,
    include_global_field_schema => params::INCLUDE_GLOBAL_FIELD_SCHEMA,
});
