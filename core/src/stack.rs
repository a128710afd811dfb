//! Entry point of the builder surface.
//!
//! # Design
//! `Stack` holds only the shared, immutable `StackConfig`. Every other
//! builder is created through a factory method here (or on
//! `ContentType`) and owns its own filter and parameter state, so two
//! operations never share mutable state. Each builder exposes the same three
//! steps:
//! - `build_request` produces an `HttpRequest` without touching the network;
//! - `parse` turns the matching `HttpResponse` into a typed model;
//! - `fetch`/`find` runs both through a `Transport` and a completion.

use std::sync::Arc;

use tracing::warn;
use url::{form_urlencoded, Url};

use crate::asset::{Asset, AssetLibrary};
use crate::config::StackConfig;
use crate::content_type::{ContentType, ContentTypes};
use crate::error::ConfigError;
use crate::filter::Filter;
use crate::global_field::{GlobalField, GlobalFields};
use crate::http::{HttpMethod, HttpRequest};
use crate::params::{self, QueryParams};
use crate::sync::SyncRequest;
use crate::taxonomy::Taxonomy;

/// Handle to one hosted content repository.
#[derive(Debug, Clone)]
pub struct Stack {
    config: Arc<StackConfig>,
}

impl Stack {
    pub fn new(config: StackConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn content_type(&self, uid: impl Into<String>) -> ContentType {
        ContentType::new(self.clone(), uid.into())
    }

    pub fn content_types(&self) -> ContentTypes {
        ContentTypes::new(self.clone())
    }

    pub fn asset(&self, uid: impl Into<String>) -> Asset {
        Asset::new(self.clone(), uid.into())
    }

    pub fn asset_library(&self) -> AssetLibrary {
        AssetLibrary::new(self.clone())
    }

    pub fn global_field(&self, uid: impl Into<String>) -> GlobalField {
        GlobalField::new(self.clone(), uid.into())
    }

    pub fn global_fields(&self) -> GlobalFields {
        GlobalFields::new(self.clone())
    }

    pub fn taxonomy(&self) -> Taxonomy {
        Taxonomy::new(self.clone())
    }

    pub fn sync(&self) -> SyncRequest {
        SyncRequest::new(self.clone())
    }

    /// Append image delivery parameters (`width`, `height`, `format`, ...)
    /// to an asset URL.
    pub fn image_transform(&self, image_url: &str, transforms: &[(&str, &str)]) -> String {
        if transforms.is_empty() {
            return image_url.to_string();
        }
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(transforms.iter())
            .finish();
        let separator = if image_url.contains('?') { '&' } else { '?' };
        format!("{image_url}{separator}{encoded}")
    }

    pub(crate) fn headers(&self) -> Headers {
        let mut headers = Headers::default();
        for (key, value) in self.config.default_headers() {
            headers.set(key, value);
        }
        headers
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let base = self.config.base_url();
        let mut url = match Url::parse(&base) {
            Ok(url) => url,
            Err(err) => {
                warn!(%base, error = %err, "base url does not parse, joining path verbatim");
                return format!("{base}/{}", segments.join("/"));
            }
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.into()
    }

    /// Assemble a GET request for the path `segments` under the stack's
    /// base URL. Each segment is percent-encoded on its own, so a uid can
    /// never add a segment, a query or a fragment.
    pub(crate) fn get(
        &self,
        segments: &[&str],
        headers: &Headers,
        filter: &Filter,
        params: &QueryParams,
        always_send_query: bool,
    ) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(segments),
            headers: headers.0.clone(),
            query: params::serialize(&self.config.environment, filter, params, always_send_query),
        }
    }
}

/// Generates `add_param`, `remove_param`, `set_header` and
/// `remove_header` for builders holding `params: QueryParams` and
/// `headers: Headers`.
macro_rules! request_overrides {
    ($($builder:ty),+ $(,)?) => {$(
        impl $builder {
            /// Set an arbitrary query parameter, replacing any previous value.
            pub fn add_param(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
                self.params.set(key, value);
                self
            }

            pub fn remove_param(&mut self, key: &str) -> &mut Self {
                self.params.remove(key);
                self
            }

            /// Set a header for this request only. Names compare case-insensitively.
            pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
                self.headers.set(key, value);
                self
            }

            pub fn remove_header(&mut self, key: &str) -> &mut Self {
                self.headers.remove(key);
                self
            }
        }
    )+};
}

/// Generates one `include_*` method per `method => PARAM` pair, each
/// setting `PARAM=true`.
macro_rules! include_flags {
    ($builder:ty { $($method:ident => $param:path),+ $(,)? }) => {
        impl $builder {$(
            pub fn $method(&mut self) -> &mut Self {
                self.params.set($param, true);
                self
            }
        )+}
    };
}

/// Generates the reference and projection methods shared by the entry
/// builders. Every `include[]`, `only[..][]` and `except[..][]` value is
/// pushed, so repeats collapse in `QueryParams`.
macro_rules! entry_projection {
    ($($builder:ty),+ $(,)?) => {$(
        impl $builder {
            /// Resolve the named reference fields in the response.
            pub fn include_reference<I, S>(&mut self, fields: I) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.params.push($crate::params::INCLUDE, fields);
                self
            }

            /// Restrict the entry's own fields to `fields`.
            pub fn only<I, S>(&mut self, fields: I) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.params.push($crate::params::only_key($crate::params::BASE), fields);
                self
            }

            pub fn except<I, S>(&mut self, fields: I) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.params.push($crate::params::except_key($crate::params::BASE), fields);
                self
            }

            /// Restrict the fields of the referenced entries under `reference`.
            pub fn only_with_reference_uid<I, S>(&mut self, fields: I, reference: &str) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.params.push($crate::params::INCLUDE, [reference]);
                self.params.push($crate::params::only_key(reference), fields);
                self
            }

            pub fn except_with_reference_uid<I, S>(&mut self, fields: I, reference: &str) -> &mut Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                self.params.push($crate::params::INCLUDE, [reference]);
                self.params.push($crate::params::except_key(reference), fields);
                self
            }

            /// Also sets `include_global_field_schema`.
            pub fn include_content_type(&mut self) -> &mut Self {
                self.params
                    .set($crate::params::INCLUDE_CONTENT_TYPE, true)
                    .set($crate::params::INCLUDE_GLOBAL_FIELD_SCHEMA, true);
                self
            }

            pub fn include_embedded_items(&mut self) -> &mut Self {
                self.params
                    .push($crate::params::INCLUDE_EMBEDDED_ITEMS, [$crate::params::BASE]);
                self
            }

            pub fn locale(&mut self, code: impl Into<String>) -> &mut Self {
                self.params.set($crate::params::LOCALE, code.into());
                self
            }
        }
    )+};
}

pub(crate) use {entry_projection, include_flags, request_overrides};

/// Request headers, names compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Headers(Vec<(String, String)>);

impl Headers {
    pub(crate) fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.0.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    }
}

/// Reject an empty identifier before a request is built.
pub(crate) fn require(value: &str, what: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(what));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::stack;
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = StackConfig::new("blt", "cs", "dev").unwrap();
        config.delivery_token.clear();
        assert_eq!(Stack::new(config).unwrap_err(), ConfigError::Missing("delivery_token"));
    }

    #[test]
    fn clones_share_config() {
        let a = stack();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.config, &b.config));
    }

    #[test]
    fn get_builds_url_headers_and_environment() {
        let s = stack();
        let req = s.get(&["assets"], &s.headers(), &Filter::new(), &QueryParams::new(), false);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://cdn.contentstack.io/v3/assets");
        assert_eq!(req.header("api_key"), Some("blt_api_key"));
        assert_eq!(req.header("access_token"), Some("cs_token"));
        assert_eq!(req.query_param("environment"), Some("production"));
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let s = stack();
        let req = s.get(
            &["content_types", "blog post", "entries", "a?b#c/d"],
            &s.headers(),
            &Filter::new(),
            &QueryParams::new(),
            false,
        );
        assert_eq!(
            req.url,
            "https://cdn.contentstack.io/v3/content_types/blog%20post/entries/a%3Fb%23c%2Fd"
        );
        let parsed = Url::parse(&req.full_url()).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert_eq!(parsed.path_segments().unwrap().count(), 5);
        assert_eq!(parsed.query(), Some("environment=production"));
    }

    #[test]
    fn custom_header_replaces_credential() {
        let config = StackConfig::new("blt_api_key", "cs_token", "production")
            .unwrap()
            .with_header("API_KEY", "blt_override");
        let headers = Stack::new(config).unwrap().headers();
        let keys: Vec<_> = headers.0.iter().filter(|(k, _)| k.eq_ignore_ascii_case("api_key")).collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].1, "blt_override");
    }

    #[test]
    fn headers_set_replaces_case_insensitively() {
        let mut headers = stack().headers();
        headers.set("API_KEY", "other");
        headers.set("x-custom", "1");
        headers.remove("ACCESS_TOKEN");
        let get = |k: &str| headers.0.iter().find(|(n, _)| n.eq_ignore_ascii_case(k)).map(|(_, v)| v.clone());
        assert_eq!(get("api_key").as_deref(), Some("other"));
        assert_eq!(get("x-custom").as_deref(), Some("1"));
        assert_eq!(get("access_token"), None);
    }

    #[test]
    fn image_transform_appends_parameters() {
        let s = stack();
        assert_eq!(
            s.image_transform("https://images.example.com/a.png", &[("width", "100"), ("format", "webp")]),
            "https://images.example.com/a.png?width=100&format=webp"
        );
        assert_eq!(
            s.image_transform("https://images.example.com/a.png?v=2", &[("height", "50")]),
            "https://images.example.com/a.png?v=2&height=50"
        );
        assert_eq!(s.image_transform("https://x/a.png", &[]), "https://x/a.png");
    }

    #[test]
    fn require_rejects_blank() {
        assert_eq!(require(" ", "entry uid").unwrap_err(), ConfigError::Missing("entry uid"));
        assert!(require("blt1", "entry uid").is_ok());
    }
}
