//! Entry lookup by taxonomy terms.
//!
//! All operators target the single `/taxonomies/entries` endpoint, which
//! always receives a `query` parameter (`{}` when nothing was set).

use serde_json::{Map, Value};

use crate::dispatch::{dispatch, json_body};
use crate::error::{ApiError, CdnError};
use crate::filter::{list_string_form, Filter, AND, OR};
use crate::http::{HttpRequest, HttpResponse};
use crate::model::EntryCollection;
use crate::params::{self, QueryParams};
use crate::stack::{include_flags, request_overrides, Headers, Stack};
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub struct Taxonomy {
    stack: Stack,
    filter: Filter,
    params: QueryParams,
    headers: Headers,
}

impl Taxonomy {
    pub(crate) fn new(stack: Stack) -> Self {
        let headers = stack.headers();
        Self {
            stack,
            filter: Filter::new(),
            params: QueryParams::new(),
            headers,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Entries tagged with any of `terms`: `{field: {"$in": terms}}`.
    pub fn in_terms<I, S>(&mut self, field: impl Into<String>, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        self.filter.set_operator(field, "$in", terms);
        self
    }

    /// `{"$or": conditions}`, stored as a JSON array.
    pub fn or(&mut self, conditions: Vec<Map<String, Value>>) -> &mut Self {
        let items = conditions.into_iter().map(Value::Object).collect::<Vec<_>>();
        self.filter.set(OR, items);
        self
    }

    /// `{"$and": "<conditions as text>"}`.
    ///
    /// Unlike [`or`](Self::or), the endpoint receives the list as a single
    /// string, e.g. `"[{\"a\":\"x\"}, {\"b\":\"y\"}]"`.
    pub fn and(&mut self, conditions: Vec<Map<String, Value>>) -> &mut Self {
        let items = conditions.into_iter().map(Value::Object).collect::<Vec<_>>();
        self.filter.set(AND, list_string_form(&items));
        self
    }

    pub fn exists(&mut self, field: impl Into<String>, exists: bool) -> &mut Self {
        self.filter.set_operator(field, "$exists", exists);
        self
    }

    /// The term and all of its descendants.
    pub fn equal_and_below(&mut self, field: impl Into<String>, term: &str) -> &mut Self {
        self.filter.set_operator(field, "$eq_below", term);
        self
    }

    /// Like [`equal_and_below`](Self::equal_and_below), limited to `level`
    /// levels. Encoded as the single string `"<term>, level: <level>"`.
    pub fn equal_and_below_with_level(&mut self, field: impl Into<String>, term: &str, level: u32) -> &mut Self {
        self.filter
            .set_operator(field, "$eq_below", format!("{term}, level: {level}"));
        self
    }

    /// Descendants only.
    pub fn below(&mut self, field: impl Into<String>, term: &str) -> &mut Self {
        self.filter.set_operator(field, "$below", term);
        self
    }

    /// The term and all of its ancestors.
    pub fn equal_above(&mut self, field: impl Into<String>, term: &str) -> &mut Self {
        self.filter.set_operator(field, "$eq_above", term);
        self
    }

    pub fn above(&mut self, field: impl Into<String>, term: &str) -> &mut Self {
        self.filter.set_operator(field, "$above", term);
        self
    }

    pub fn locale(&mut self, code: impl Into<String>) -> &mut Self {
        self.params.set(params::LOCALE, code.into());
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
            .get(&["taxonomies", "entries"], &self.headers, &self.filter, &self.params, true)
    }

    pub fn parse(response: HttpResponse) -> Result<EntryCollection, ApiError> {
        let body = json_body(&response)?;
        Ok(EntryCollection::from_response(&body))
    }

    pub fn find<F>(&self, transport: &dyn Transport, on_complete: F)
    where
        F: FnOnce(Result<EntryCollection, CdnError>) + Send + 'static,
    {
        dispatch(transport, self.build_request(), Self::parse, on_complete);
    }
}

request_overrides!(Taxonomy);

include_flags!(Taxonomy {
    include_count => params::INCLUDE_COUNT,
});
