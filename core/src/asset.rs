//! Asset fetch and the asset library listing.

use serde_json::{Map, Value};

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError, ConfigError};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{AssetCollection, AssetModel};
use crate::normalize;
use crate::params::{self, QueryParams};
use crate::stack::{include_flags, request_overrides, require, Headers, Stack};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct Asset {
    stack: Stack,
    uid: String,
    params: QueryParams,
    headers: Headers,
}

impl Asset {
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

    pub fn locale(&mut self, code: impl Into<String>) -> &mut Self {
        self.params.set(params::LOCALE, code.into());
        self
    }

    pub fn build_request(&self) -> Result<HttpRequest, ConfigError> {
        require(&self.uid, "asset uid")?;
        Ok(self.stack.get(
            &["assets", &self.uid],
            &self.headers,
            &Filter::new(),
            &self.params,
            false,
        ))
    }

    /// A payload with no asset object yields an empty model.
    pub fn parse(response: HttpResponse) -> Result<AssetModel, ApiError> {
        let body = json_body(&response)?;
        let empty = Map::new();
        Ok(AssetModel::from_json(normalize::single(&body, "asset").unwrap_or(&empty)))
    }

    pub fn fetch<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<AssetModel, CdnError>) + Send + 'static,
    {
        let request = self.build_request()?;
        dispatch(transport, request, Self::parse, on_complete);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Listing of the stack's assets.
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    stack: Stack,
    filter: Filter,
    params: QueryParams,
    headers: Headers,
}

impl AssetLibrary {
    pub(crate) fn new(stack: Stack) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            filter: Filter::new(),
            params: QueryParams::new(),
            headers,
        }
    }

    /// Return asset URLs relative to the asset host.
    pub fn include_relative_url(&mut self) -> &mut Self {
        self.params.set(params::RELATIVE_URLS, true);
        self
    }

    /// Sort by `field`. Only one sort key is kept.
    pub fn sort(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        self.params.remove(params::ASC).remove(params::DESC);
        let key = match order {
            SortOrder::Ascending => params::ASC,
            SortOrder::Descending => params::DESC,
        };
        self.params.set(key, field.into());
        self
    }

    pub fn where_equals(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set(field, value);
        self
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
            .get(&["assets"], &self.headers, &self.filter, &self.params, false)
    }

    /// Fails with a shape error when `assets` is present but not an array.
    pub fn parse(response: HttpResponse) -> Result<AssetCollection, ApiError> {
        let body = json_body(&response)?;
        Ok(AssetCollection::from_response(&body)?)
    }

    pub fn fetch_all<F>(&self, transport: &dyn Transport, on_complete: F)
    where
        F: FnOnce(Result<AssetCollection, CdnError>) + Send + 'static,
    {
        dispatch(transport, self.build_request(), Self::parse, on_complete);
    }
}

request_overrides!(Asset, AssetLibrary);

include_flags!(Asset {
    include_dimension => params::INCLUDE_DIMENSION,
    include_fallback => params::INCLUDE_FALLBACK,
    include_branch => params::INCLUDE_BRANCH,
    include_metadata => params::INCLUDE_METADATA,
});

include_flags!(AssetLibrary {
    include_count => params::INCLUDE_COUNT,
    include_fallback => params::INCLUDE_FALLBACK,
    include_metadata => params::INCLUDE_METADATA,
    include_branch => params::INCLUDE_BRANCH,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::{await_one, CannedTransport};
    use crate::error::{ErrorKind, ShapeError};
    use crate::stack::testing::stack;
    use pretty_assertions::assert_eq;

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn asset_request_and_parse() {
        let mut asset = stack().asset("blt_a1");
        asset.include_dimension().locale("en-us");
        let req = asset.build_request().unwrap();
        assert_eq!(req.url, "https://cdn.contentstack.io/v3/assets/blt_a1");
        assert_eq!(req.query_param("include_dimension"), Some("true"));

        let model = Asset::parse(ok(
            r#"{"asset":{"uid":"blt_a1","filename":"a.png","dimension":{"height":10,"width":20},"is_dir":"true"}}"#,
        ))
        .unwrap();
        assert_eq!(model.file_name.as_deref(), Some("a.png"));
        assert_eq!(model.dimension.map(|d| d.width), Some(20));
        assert_eq!(model.is_dir, None);
    }

    #[test]
    fn asset_without_uid_is_rejected() {
        assert_eq!(
            stack().asset("").build_request().unwrap_err(),
            ConfigError::Missing("asset uid")
        );
    }

    #[test]
    fn library_sort_keeps_one_key() {
        let mut library = stack().asset_library();
        library
            .sort("created_at", SortOrder::Ascending)
            .sort("file_size", SortOrder::Descending)
            .where_equals("content_type", "image/png")
            .include_relative_url();
        let req = library.build_request();
        assert_eq!(req.query_param("asc"), None);
        assert_eq!(req.query_param("desc"), Some("file_size"));
        assert_eq!(req.query_param("relative_urls"), Some("true"));
        assert_eq!(req.query_param("query"), Some(r#"{"content_type":"image/png"}"#));
    }

    #[test]
    fn non_list_assets_is_a_shape_error() {
        for body in [
            r#"{"assets":"not_a_list"}"#,
            r#"{"assets":12345}"#,
            r#"{"assets":true}"#,
            r#"{"assets":{}}"#,
        ] {
            match AssetLibrary::parse(ok(body)) {
                Err(ApiError::Shape(ShapeError::NotAList { field, .. })) => assert_eq!(field, "assets"),
                other => panic!("{body}: expected shape error, got {other:?}"),
            }
        }
    }

    #[test]
    fn shape_error_reaches_completion_with_field_details() {
        let transport = CannedTransport::new(200, r#"{"assets":"not_a_list"}"#);
        let library = stack().asset_library();
        let err = await_one::<AssetCollection, _>(|done| library.fetch_all(&transport, done)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Shape);
        assert_eq!(err.details.as_deref(), Some("assets"));
        assert!(err.message.contains("List or ArrayList"));
    }

    #[test]
    fn transport_failure_reaches_completion_as_transport_kind() {
        let transport = CannedTransport::new(0, "connection refused");
        let library = stack().asset_library();
        let err = await_one::<AssetCollection, _>(|done| library.fetch_all(&transport, done)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(err.details, None);
    }

    #[test]
    fn asset_parse_tolerates_missing_object() {
        let model = Asset::parse(ok(r#"{"asset":null}"#)).unwrap();
        assert_eq!(model.uid, None);
        assert_eq!(model.file_name, None);
    }

    #[test]
    fn asset_uid_is_one_path_segment() {
        let req = stack().asset("../entries?x=1").build_request().unwrap();
        assert_eq!(req.url, "https://cdn.contentstack.io/v3/assets/..%2Fentries%3Fx=1");
    }

    #[test]
    fn library_overrides_remove_what_they_set() {
        let mut library = stack().asset_library();
        library
            .add_param("folder", "blt_f1")
            .add_param("tmp", 1)
            .remove_param("tmp")
            .set_header("branch", "main")
            .remove_header("BRANCH")
            .set_header("access_token", "cs_other");
        let req = library.build_request();
        assert_eq!(req.query_param("folder"), Some("blt_f1"));
        assert_eq!(req.query_param("tmp"), None);
        assert_eq!(req.header("branch"), None);
        let tokens: Vec<_> = req.headers.iter().filter(|(k, _)| k == "access_token").collect();
        assert_eq!(tokens, vec![&("access_token".to_string(), "cs_other".to_string())]);
    }

    #[test]
    fn fetch_all_counts_from_objects_fallback() {
        let transport = CannedTransport::new(200, r#"{"assets":[{"uid":"a"},{"uid":"b"}],"objects":2}"#);
        let mut library = stack().asset_library();
        library.include_count();
        let result = await_one::<AssetCollection, _>(|done| library.fetch_all(&transport, done)).unwrap();
        assert_eq!(result.assets.len(), 2);
        assert_eq!(result.count, Some(2));
    }
}
