//! HTTP request/response descriptors exchanged with the transport.
//!
//! # Design
//! The core never opens a socket. Builders produce an `HttpRequest` that
//! fully describes the read-only fetch, and parsers consume an
//! `HttpResponse` produced by whoever executed it: a `Transport`
//! implementation, a test harness, or a C host through `cdn-ffi`.
//!
//! All fields use owned types (`String`, `Vec`) so values can be moved to a
//! transport thread or across the FFI boundary without lifetime concerns.

use url::form_urlencoded;

/// HTTP method for a request. The delivery API is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// A request described as plain data.
///
/// `url` is the absolute endpoint without a query string; `query` holds the
/// ordered, unencoded parameter pairs. Use [`HttpRequest::full_url`] to get
/// the percent-encoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl HttpRequest {
    /// The form-urlencoded query string, without the leading `?`.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish()
    }

    /// Absolute URL including the encoded query string.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        format!("{}?{}", self.url, self.query_string())
    }

    /// First value of the query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response described as plain data.
///
/// `status` is `0` when the transport failed before receiving any status
/// (DNS failure, refused connection); `body` then carries the transport's
/// own error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A response standing in for a transport-level failure.
    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            headers: Vec::new(),
            body: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: Vec<(&str, &str)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "https://cdn.example.com/v3/taxonomies/entries".to_string(),
            headers: vec![("api_key".to_string(), "blt123".to_string())],
            query: query
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn full_url_without_query_is_bare() {
        let req = request(vec![]);
        assert_eq!(req.full_url(), "https://cdn.example.com/v3/taxonomies/entries");
    }

    #[test]
    fn full_url_percent_encodes_json() {
        let req = request(vec![("query", r#"{"a":"b c"}"#)]);
        assert_eq!(
            req.full_url(),
            "https://cdn.example.com/v3/taxonomies/entries?query=%7B%22a%22%3A%22b+c%22%7D"
        );
    }

    #[test]
    fn bracketed_names_are_encoded() {
        let req = request(vec![("include[]", "author")]);
        assert_eq!(req.query_string(), "include%5B%5D=author");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request(vec![]);
        assert_eq!(req.header("API_KEY"), Some("blt123"));
        assert_eq!(req.header("access_token"), None);
    }

    #[test]
    fn success_range() {
        let mut resp = HttpResponse::transport_failure("refused");
        assert!(!resp.is_success());
        resp.status = 204;
        assert!(resp.is_success());
        resp.status = 300;
        assert!(!resp.is_success());
    }
}
