//! Single entry fetch.

use serde_json::Map;

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError, ConfigError};
use crate::filter::Filter;
use crate::http::{HttpRequest, HttpResponse};
use crate::model::EntryModel;
use crate::normalize;
use crate::params::{self, QueryParams};
use crate::stack::{entry_projection, include_flags, request_overrides, require, Headers, Stack};
use crate::transport::Transport;

/// Fetch of one entry of one content type, created by
/// [`ContentType::entry`](crate::ContentType::entry).
#[derive(Debug, Clone)]
pub struct Entry {
    stack: Stack,
    content_type_uid: String,
    uid: String,
    params: QueryParams,
    headers: Headers,
}

impl Entry {
    pub(crate) fn new(stack: Stack, content_type_uid: String, uid: String) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            content_type_uid,
            uid,
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn content_type_uid(&self) -> &str {
        &self.content_type_uid
    }

    pub fn build_request(&self) -> Result<HttpRequest, ConfigError> {
        require(&self.content_type_uid, "content type uid")?;
        require(&self.uid, "entry uid")?;
        Ok(self.stack.get(
            &["content_types", &self.content_type_uid, "entries", &self.uid],
            &self.headers,
            &Filter::new(),
            &self.params,
            false,
        ))
    }

    /// Map a response. A payload with no entry object yields an empty
    /// model; only a body that is not JSON fails.
    pub fn parse(response: HttpResponse) -> Result<EntryModel, ApiError> {
        let body = json_body(&response)?;
        let empty = Map::new();
        Ok(EntryModel::from_json(normalize::single(&body, "entry").unwrap_or(&empty)))
    }

    pub fn fetch<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<EntryModel, CdnError>) + Send + 'static,
    {
        let request = self.build_request()?;
        dispatch(transport, request, Self::parse, on_complete);
        Ok(())
    }
}

request_overrides!(Entry);
entry_projection!(Entry);

include_flags!(Entry {
    include_reference_content_type_uid => params::INCLUDE_REFERENCE_CONTENT_TYPE_UID,
    include_fallback => params::INCLUDE_FALLBACK,
    include_branch => params::INCLUDE_BRANCH,
    include_metadata => params::INCLUDE_METADATA,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::{await_one, CannedTransport};
    use crate::stack::testing::stack;
    use pretty_assertions::assert_eq;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn request_carries_projection_and_includes() {
        let mut entry = stack().content_type("blog_post").entry("blt_e1");
        entry
            .locale("fr-fr")
            .include_reference(["author"])
            .only(["title", "url"])
            .except_with_reference_uid(["bio"], "author")
            .include_fallback();
        let req = entry.build_request().unwrap();
        assert_eq!(
            req.url,
            "https://cdn.contentstack.io/v3/content_types/blog_post/entries/blt_e1"
        );
        assert_eq!(
            req.query,
            pairs(&[
                ("environment", "production"),
                ("locale", "fr-fr"),
                ("include[]", "author"),
                ("only[BASE][]", "title"),
                ("only[BASE][]", "url"),
                ("except[author][]", "bio"),
                ("include_fallback", "true"),
            ])
        );
    }

    #[test]
    fn include_content_type_sets_both_flags() {
        let mut entry = stack().content_type("blog_post").entry("blt_e1");
        entry.include_content_type();
        let req = entry.build_request().unwrap();
        assert_eq!(req.query_param("include_content_type"), Some("true"));
        assert_eq!(req.query_param("include_global_field_schema"), Some("true"));
    }

    #[test]
    fn missing_uid_fails_before_dispatch() {
        let entry = stack().content_type("blog_post").entry("");
        assert_eq!(entry.build_request().unwrap_err(), ConfigError::Missing("entry uid"));
    }

    #[test]
    fn fetch_maps_wrapped_entry() {
        let transport = CannedTransport::new(
            200,
            r#"{"entry":{"uid":"blt_e1","title":"Hello","locale":"en-us","tags":[]}}"#,
        );
        let entry = stack().content_type("blog_post").entry("blt_e1");
        let model = await_one::<EntryModel, _>(|done| entry.fetch(&transport, done).unwrap()).unwrap();
        assert_eq!(model.title.as_deref(), Some("Hello"));
        assert_eq!(model.language.as_deref(), Some("en-us"));
        assert_eq!(model.tags, None);
    }

    #[test]
    fn fetch_reports_api_error() {
        let transport = CannedTransport::new(
            422,
            r#"{"error_message":"The requested entry doesn't exist.","error_code":141,"errors":{"uid":["is not valid."]}}"#,
        );
        let entry = stack().content_type("blog_post").entry("blt_missing");
        let err = await_one::<EntryModel, _>(|done| entry.fetch(&transport, done).unwrap()).unwrap_err();
        assert_eq!(err.code, 141);
        assert!(err.details.unwrap().contains("uid"));
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn uids_cannot_escape_their_path_segment() {
        let entry = stack().content_type("blog post").entry("a?b#c/d");
        let req = entry.build_request().unwrap();
        assert_eq!(
            req.url,
            "https://cdn.contentstack.io/v3/content_types/blog%20post/entries/a%3Fb%23c%2Fd"
        );
        assert_eq!(req.query, pairs(&[("environment", "production")]));
    }

    #[test]
    fn parse_degrades_missing_entry_to_empty_model() {
        for body in [r#"{"entry":null}"#, r#"{"entry":"x"}"#, "[1,2]", "{}"] {
            let model = Entry::parse(ok(body)).unwrap();
            assert_eq!(model.uid, None, "{body}");
            assert_eq!(model.title, None, "{body}");
        }
    }

    #[test]
    fn parse_rejects_body_that_is_not_json() {
        assert!(matches!(Entry::parse(ok("<html>")), Err(ApiError::Deserialization(_))));
    }

    #[test]
    fn overrides_and_flags_apply_to_request() {
        let mut entry = stack().content_type("blog_post").entry("blt_e1");
        entry
            .include_branch()
            .include_metadata()
            .add_param("custom", 1)
            .remove_param("include_branch")
            .set_header("x-branch", "dev")
            .remove_header("X-Branch");
        let req = entry.build_request().unwrap();
        assert_eq!(req.query_param("include_branch"), None);
        assert_eq!(req.query_param("include_metadata"), Some("true"));
        assert_eq!(req.query_param("custom"), Some("1"));
        assert_eq!(req.header("x-branch"), None);
    }
}
