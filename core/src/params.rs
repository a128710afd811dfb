//! Auxiliary query parameters and final parameter serialization.
//!
//! Parameter names are part of the delivery API's wire contract. A name is
//! either single-valued (`limit`, `locale`) and overwritten on repeat, or
//! list-valued (`include[]`, `only[BASE][]`) and appended to.

use crate::filter::Filter;

pub const QUERY: &str = "query";
pub const ENVIRONMENT: &str = "environment";
pub const LIMIT: &str = "limit";
pub const SKIP: &str = "skip";
pub const ASC: &str = "asc";
pub const DESC: &str = "desc";
pub const LOCALE: &str = "locale";
pub const INCLUDE: &str = "include[]";
pub const INCLUDE_COUNT: &str = "include_count";
pub const COUNT: &str = "count";
pub const INCLUDE_CONTENT_TYPE: &str = "include_content_type";
pub const INCLUDE_GLOBAL_FIELD_SCHEMA: &str = "include_global_field_schema";
pub const INCLUDE_REFERENCE_CONTENT_TYPE_UID: &str = "include_reference_content_type_uid";
pub const INCLUDE_OWNER: &str = "include_owner";
pub const INCLUDE_FALLBACK: &str = "include_fallback";
pub const INCLUDE_EMBEDDED_ITEMS: &str = "include_embedded_items[]";
pub const INCLUDE_BRANCH: &str = "include_branch";
pub const INCLUDE_METADATA: &str = "include_metadata";
pub const INCLUDE_DIMENSION: &str = "include_dimension";
pub const RELATIVE_URLS: &str = "relative_urls";
pub const TYPEAHEAD: &str = "typeahead";
pub const INIT: &str = "init";
pub const SYNC_TOKEN: &str = "sync_token";
pub const PAGINATION_TOKEN: &str = "pagination_token";
pub const START_FROM: &str = "start_from";
pub const CONTENT_TYPE_UID: &str = "content_type_uid";
pub const PUBLISH_TYPE: &str = "type";

/// Reference scope meaning "fields of the fetched entry itself".
pub const BASE: &str = "BASE";

/// `only[<scope>][]`
pub fn only_key(scope: &str) -> String {
    format!("only[{scope}][]")
}

/// `except[<scope>][]`
pub fn except_key(scope: &str) -> String {
    format!("except[{scope}][]")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamValue {
    Single(String),
    List(Vec<String>),
}

/// Ordered parameter set. First insertion fixes a name's position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single-valued parameter, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        let name = name.into();
        let value = ParamValue::Single(value.to_string());
        match self.position(&name) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Append values to a list-valued parameter. A value already in the
    /// list is not added again.
    pub fn push<I, S>(&mut self, name: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let i = match self.position(&name) {
            Some(i) => i,
            None => {
                self.entries.push((name, ParamValue::List(Vec::new())));
                self.entries.len() - 1
            }
        };
        let slot = &mut self.entries[i].1;
        if let ParamValue::Single(_) = slot {
            *slot = ParamValue::List(Vec::new());
        }
        if let ParamValue::List(list) = slot {
            for value in values.into_iter().map(Into::into) {
                if !list.contains(&value) {
                    list.push(value);
                }
            }
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> &mut Self {
        self.entries.retain(|(n, _)| n != name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).and_then(|i| match &self.entries[i].1 {
            ParamValue::Single(v) => Some(v.as_str()),
            ParamValue::List(list) => list.first().map(String::as_str),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    /// Flatten into wire pairs, list values repeated once per element.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.entries {
            match value {
                ParamValue::Single(v) => pairs.push((name.clone(), v.clone())),
                ParamValue::List(list) => {
                    pairs.extend(list.iter().map(|v| (name.clone(), v.clone())));
                }
            }
        }
        pairs
    }
}

/// Assemble the wire parameters for one request.
///
/// Order: `environment`, then `query` (omitted when the filter is empty and
/// `always_send_query` is false), then the auxiliary parameters in
/// insertion order.
pub fn serialize(
    environment: &str,
    filter: &Filter,
    params: &QueryParams,
    always_send_query: bool,
) -> Vec<(String, String)> {
    let mut pairs = vec![(ENVIRONMENT.to_string(), environment.to_string())];
    if always_send_query || !filter.is_empty() {
        pairs.push((QUERY.to_string(), filter.to_json_string()));
    }
    pairs.extend(
        params
            .to_pairs()
            .into_iter()
            .filter(|(name, _)| name != ENVIRONMENT && name != QUERY),
    );
    pairs
}
