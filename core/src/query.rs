//! Entry queries against one content type.

use serde_json::{json, Value};

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError, ConfigError};
use crate::filter::{Filter, AND, OR};
use crate::http::{HttpRequest, HttpResponse};
use crate::model::{EntryCollection, EntryModel};
use crate::params::{self, QueryParams};
use crate::stack::{entry_projection, include_flags, request_overrides, require, Headers, Stack};
use crate::transport::Transport;

/// Filtered listing of the entries of one content type, created by
/// [`ContentType::query`](crate::ContentType::query).
///
/// Every filter method sets the predicate for its field path, replacing
/// any predicate set earlier on the same path. Calling `less_than` then
/// `greater_than` on `price` leaves only the `$gt` condition.
#[derive(Debug, Clone)]
pub struct Query {
    stack: Stack,
    content_type_uid: String,
    filter: Filter,
    params: QueryParams,
    headers: Headers,
}

impl Query {
    pub(crate) fn new(stack: Stack, content_type_uid: String) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            content_type_uid,
            filter: Filter::new(),
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn content_type_uid(&self) -> &str {
        &self.content_type_uid
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn where_equals(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set(field, value);
        self
    }

    pub fn not_equal_to(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set_operator(field, "$ne", value);
        self
    }

    pub fn less_than(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set_operator(field, "$lt", value);
        self
    }

    pub fn less_than_or_equal_to(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set_operator(field, "$lte", value);
        self
    }

    pub fn greater_than(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set_operator(field, "$gt", value);
        self
    }

    pub fn greater_than_or_equal_to(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.filter.set_operator(field, "$gte", value);
        self
    }

    pub fn contained_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter.set_operator(field, "$in", values);
        self
    }

    pub fn not_contained_in<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter.set_operator(field, "$nin", values);
        self
    }

    pub fn exists(&mut self, field: impl Into<String>) -> &mut Self {
        self.filter.set_operator(field, "$exists", true);
        self
    }

    pub fn not_exists(&mut self, field: impl Into<String>) -> &mut Self {
        self.filter.set_operator(field, "$exists", false);
        self
    }

    /// `{field: {"$regex": pattern, "$options": options}}`, options omitted
    /// when `None`.
    pub fn regex(&mut self, field: impl Into<String>, pattern: &str, options: Option<&str>) -> &mut Self {
        let predicate = match options {
            Some(options) => json!({"$regex": pattern, "$options": options}),
            None => json!({"$regex": pattern}),
        };
        self.filter.set(field, predicate);
        self
    }

    /// Entries carrying any of `tags`.
    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.filter.set_operator("tags", "$in", tags);
        self
    }

    /// Entries whose reference field `field` points at entries matching `sub`.
    pub fn where_in(&mut self, field: impl Into<String>, sub: &Query) -> &mut Self {
        self.filter.set_operator(field, "$in_query", sub.filter.to_value());
        self
    }

    pub fn where_not_in(&mut self, field: impl Into<String>, sub: &Query) -> &mut Self {
        self.filter.set_operator(field, "$nin_query", sub.filter.to_value());
        self
    }

    pub fn or(&mut self, queries: &[Query]) -> &mut Self {
        self.filter.set(OR, combine(queries));
        self
    }

    pub fn and(&mut self, queries: &[Query]) -> &mut Self {
        self.filter.set(AND, combine(queries));
        self
    }

    /// Drop the predicate on `field`, if any.
    pub fn remove_query(&mut self, field: &str) -> &mut Self {
        self.filter.remove(field);
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

    pub fn ascending(&mut self, field: impl Into<String>) -> &mut Self {
        self.params.set(params::ASC, field.into());
        self
    }

    pub fn descending(&mut self, field: impl Into<String>) -> &mut Self {
        self.params.set(params::DESC, field.into());
        self
    }

    /// Ask for the number of matches only.
    pub fn count(&mut self) -> &mut Self {
        self.params.set(params::COUNT, true);
        self
    }

    /// Typeahead search over the entries' text fields.
    pub fn search(&mut self, text: impl Into<String>) -> &mut Self {
        self.params.set(params::TYPEAHEAD, text.into());
        self
    }

    pub fn build_request(&self) -> Result<HttpRequest, ConfigError> {
        self.request_with(&self.params)
    }

    fn request_with(&self, params: &QueryParams) -> Result<HttpRequest, ConfigError> {
        require(&self.content_type_uid, "content type uid")?;
        Ok(self.stack.get(
            &["content_types", &self.content_type_uid, "entries"],
            &self.headers,
            &self.filter,
            params,
            false,
        ))
    }

    pub fn parse(response: HttpResponse) -> Result<EntryCollection, ApiError> {
        let body = json_body(&response)?;
        Ok(EntryCollection::from_response(&body))
    }

    pub fn find<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<EntryCollection, CdnError>) + Send + 'static,
    {
        let request = self.build_request()?;
        dispatch(transport, request, Self::parse, on_complete);
        Ok(())
    }

    /// Like [`find`](Self::find) with `limit=1`, yielding the first match.
    /// The builder's own parameters are left untouched.
    pub fn find_one<F>(&self, transport: &dyn Transport, on_complete: F) -> Result<(), ConfigError>
    where
        F: FnOnce(Result<Option<EntryModel>, CdnError>) + Send + 'static,
    {
        let mut params = self.params.clone();
        params.set(params::LIMIT, 1);
        let request = self.request_with(&params)?;
        dispatch(
            transport,
            request,
            |response| Self::parse(response).map(|c| c.entries.into_iter().next()),
            on_complete,
        );
        Ok(())
    }
}

fn combine(queries: &[Query]) -> Value {
    Value::Array(queries.iter().map(|q| q.filter.to_value()).collect())
}

request_overrides!(Query);
entry_projection!(Query);

include_flags!(Query {
    include_count => params::INCLUDE_COUNT,
    include_owner => params::INCLUDE_OWNER,
    include_reference_content_type_uid => params::INCLUDE_REFERENCE_CONTENT_TYPE_UID,
    include_fallback => params::INCLUDE_FALLBACK,
    include_branch => params::INCLUDE_BRANCH,
    include_metadata => params::INCLUDE_METADATA,
});
