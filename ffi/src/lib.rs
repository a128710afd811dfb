//! C-ABI wrapper around `cdn-core`.
//!
//! # Overview
//! Exposes the delivery builders through `extern "C"` functions so any
//! language with a C FFI can build requests, execute them with its own
//! HTTP stack, and hand the responses back for normalization and mapping.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `cdn_build_*` functions return an `FfiHttpRequest` with the encoded
//!   URL and headers. Build failures (null or empty identifiers) yield null.
//! - `cdn_parse` maps a response for a given `FfiResponseKind` into one
//!   `FfiResult` envelope whose success payload is the model as JSON.
//! - `cdn_complete` does the same through the core dispatcher and invokes a
//!   C callback exactly once.
//! - The C caller owns all returned pointers and must call the matching
//!   `cdn_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use cdn_core::error::ApiError;
use cdn_core::{
    Asset, AssetLibrary, ContentType, ContentTypes, Entry, GlobalField, GlobalFields, HttpMethod, HttpRequest,
    HttpResponse, Query, Responder, StackConfig, SyncRequest, Taxonomy, Transport,
};
use serde::Serialize;
use serde_json::Value;

use types::*;

/// Borrow a C string, treating null as absent.
fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap_or(""))
}

fn req_str<'a>(ptr: *const c_char) -> &'a str {
    opt_str(ptr).unwrap_or("")
}

fn stack_ref<'a>(stack: *const FfiStack) -> Option<&'a cdn_core::Stack> {
    if stack.is_null() {
        return None;
    }
    Some(unsafe { &(*stack).inner })
}

// ---------------------------------------------------------------------------
// Stack lifecycle
// ---------------------------------------------------------------------------

/// Create a stack handle from credentials.
///
/// `host` may be null to use the default delivery host. Returns null if any
/// credential is null or empty, or if an internal panic occurs. The caller
/// must free the returned pointer with `cdn_stack_free`.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_stack_new(
    api_key: *const c_char,
    delivery_token: *const c_char,
    environment: *const c_char,
    host: *const c_char,
) -> *mut FfiStack {
    catch_unwind(|| {
        let (Some(api_key), Some(token), Some(env)) =
            (opt_str(api_key), opt_str(delivery_token), opt_str(environment))
        else {
            return std::ptr::null_mut();
        };
        let mut config = match StackConfig::new(api_key, token, env) {
            Ok(config) => config,
            Err(_) => return std::ptr::null_mut(),
        };
        if let Some(host) = opt_str(host).filter(|h| !h.is_empty()) {
            config = config.with_host(host);
        }
        match cdn_core::Stack::new(config) {
            Ok(inner) => Box::into_raw(Box::new(FfiStack { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a stack created by `cdn_stack_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_stack_free(stack: *mut FfiStack) {
    if !stack.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(stack) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a request for one entry. `locale` may be null.
///
/// Returns null if `stack` is null or either uid is null or empty.
/// The caller must free the returned pointer with `cdn_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_entry(
    stack: *const FfiStack,
    content_type_uid: *const c_char,
    entry_uid: *const c_char,
    locale: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        let mut entry = stack
            .content_type(req_str(content_type_uid))
            .entry(req_str(entry_uid));
        if let Some(locale) = opt_str(locale) {
            entry.locale(locale);
        }
        match entry.build_request() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an entries query.
///
/// `filter_json` may be null; otherwise it must be a JSON object whose
/// pairs become equality conditions. `limit` and `skip` are ignored when
/// negative. Returns null on a null stack, an empty content type uid, or a
/// filter that is not a JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_entries_query(
    stack: *const FfiStack,
    content_type_uid: *const c_char,
    filter_json: *const c_char,
    limit: i32,
    skip: i32,
    include_count: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        let mut query = stack.content_type(req_str(content_type_uid)).query();
        if let Some(raw) = opt_str(filter_json) {
            match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(conditions)) => {
                    for (field, value) in conditions {
                        query.where_equals(field, value);
                    }
                }
                _ => return std::ptr::null_mut(),
            }
        }
        if let Ok(limit) = u32::try_from(limit) {
            query.limit(limit);
        }
        if let Ok(skip) = u32::try_from(skip) {
            query.skip(skip);
        }
        if include_count {
            query.include_count();
        }
        match query.build_request() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request for one content type's schema.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_content_type(stack: *const FfiStack, uid: *const c_char) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        match stack.content_type(req_str(uid)).build_request() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request listing all content types.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_content_types(stack: *const FfiStack, include_count: bool) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        let mut list = stack.content_types();
        if include_count {
            list.include_count();
        }
        FfiHttpRequest::from_core(list.build_request())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request for one asset.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_asset(stack: *const FfiStack, uid: *const c_char) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        match stack.asset(req_str(uid)).build_request() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request listing the asset library.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_asset_library(stack: *const FfiStack, include_count: bool) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        let mut library = stack.asset_library();
        if include_count {
            library.include_count();
        }
        FfiHttpRequest::from_core(library.build_request())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a request for one global field.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_global_field(stack: *const FfiStack, uid: *const c_char) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        match stack.global_field(req_str(uid)).build_request() {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a taxonomy entries query with a single operator.
///
/// `In` uses every term; the hierarchy operators use the first term.
/// `level` applies to `EqualAndBelow` only and is ignored when not
/// positive. Returns null on a null stack or field, or when an operator
/// needing a term receives none.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_taxonomy_query(
    stack: *const FfiStack,
    op: FfiTaxonomyOp,
    field: *const c_char,
    terms: *const *const c_char,
    terms_len: u32,
    level: i32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let (Some(stack), Some(field)) = (stack_ref(stack), opt_str(field)) else {
            return std::ptr::null_mut();
        };
        let terms: Vec<&str> = if terms.is_null() {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(terms, terms_len as usize) }
                .iter()
                .filter_map(|t| opt_str(*t))
                .collect()
        };
        let mut taxonomy = stack.taxonomy();
        match (op, terms.first().copied()) {
            (FfiTaxonomyOp::In, _) => taxonomy.in_terms(field, terms.iter().copied()),
            (_, None) => return std::ptr::null_mut(),
            (FfiTaxonomyOp::EqualAndBelow, Some(term)) => match u32::try_from(level) {
                Ok(level) if level > 0 => taxonomy.equal_and_below_with_level(field, term, level),
                _ => taxonomy.equal_and_below(field, term),
            },
            (FfiTaxonomyOp::Below, Some(term)) => taxonomy.below(field, term),
            (FfiTaxonomyOp::EqualAbove, Some(term)) => taxonomy.equal_above(field, term),
            (FfiTaxonomyOp::Above, Some(term)) => taxonomy.above(field, term),
        };
        FfiHttpRequest::from_core(taxonomy.build_request())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a taxonomy entries query testing whether `field` is present.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_taxonomy_exists(
    stack: *const FfiStack,
    field: *const c_char,
    exists: bool,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let (Some(stack), Some(field)) = (stack_ref(stack), opt_str(field)) else {
            return std::ptr::null_mut();
        };
        let mut taxonomy = stack.taxonomy();
        taxonomy.exists(field, exists);
        FfiHttpRequest::from_core(taxonomy.build_request())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a sync request.
///
/// Both tokens may be null. A pagination token wins over a sync token;
/// with neither, the request starts an initial sync.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_build_sync(
    stack: *const FfiStack,
    sync_token: *const c_char,
    pagination_token: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        let Some(stack) = stack_ref(stack) else {
            return std::ptr::null_mut();
        };
        let mut sync = stack.sync();
        if let Some(token) = opt_str(sync_token) {
            sync.sync_token(token);
        }
        if let Some(token) = opt_str(pagination_token) {
            sync.pagination_token(token);
        }
        FfiHttpRequest::from_core(sync.build_request())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse and complete
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// read as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body: req_str(resp.body).to_string(),
    }
}

type Parsed = Result<Result<String, serde_json::Error>, ApiError>;

fn to_json<T: Serialize>(parsed: Result<T, ApiError>) -> Parsed {
    parsed.map(|model| serde_json::to_string(&model))
}

fn parse_kind(kind: FfiResponseKind, response: HttpResponse) -> Parsed {
    match kind {
        FfiResponseKind::Entry => to_json(Entry::parse(response)),
        FfiResponseKind::Entries => to_json(Query::parse(response)),
        FfiResponseKind::Asset => to_json(Asset::parse(response)),
        FfiResponseKind::Assets => to_json(AssetLibrary::parse(response)),
        FfiResponseKind::ContentType => to_json(ContentType::parse(response)),
        FfiResponseKind::ContentTypes => to_json(ContentTypes::parse(response)),
        FfiResponseKind::GlobalField => to_json(GlobalField::parse(response)),
        FfiResponseKind::GlobalFields => to_json(GlobalFields::parse(response)),
        FfiResponseKind::Taxonomy => to_json(Taxonomy::parse(response)),
        FfiResponseKind::Sync => to_json(SyncRequest::parse(response)),
    }
}

fn envelope(parsed: Parsed) -> *mut FfiResult {
    match parsed {
        Ok(Ok(json)) => FfiResult::ok(json),
        Ok(Err(e)) => FfiResult::serialization(e.to_string()),
        Err(e) => FfiResult::from_error(e),
    }
}

/// Parse a response for the operation `kind` into a result envelope.
///
/// Never returns null. The caller must free the result with
/// `cdn_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_parse(kind: FfiResponseKind, response: *const FfiHttpResponse) -> *mut FfiResult {
    catch_unwind(|| {
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let resp = ffi_response_to_core(unsafe { &*response });
        envelope(parse_kind(kind, resp))
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in cdn_parse"))
}

/// Replays a response the host already received.
struct Answered(HttpResponse);

impl Transport for Answered {
    fn send(&self, _request: HttpRequest, respond: Responder) {
        respond(self.0.clone());
    }
}

/// Caller-supplied completion, moved into the dispatcher.
struct Callback {
    callback: FfiCallback,
    user_data: *mut c_void,
}

// The pointer is opaque to us and only handed back to the callback.
unsafe impl Send for Callback {}

impl Callback {
    fn invoke(self, result: *mut FfiResult) {
        (self.callback)(self.user_data, result);
        cdn_free_result(result);
    }
}

/// Complete `request` with the host's `response` and invoke `callback`
/// exactly once with the result, on the calling thread.
///
/// The result passed to `callback` is freed when the callback returns.
/// Returns false without invoking `callback` if `request` or `response`
/// is null.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_complete(
    request: *const FfiHttpRequest,
    kind: FfiResponseKind,
    response: *const FfiHttpResponse,
    callback: FfiCallback,
    user_data: *mut c_void,
) -> bool {
    if request.is_null() || response.is_null() {
        return false;
    }
    let completion = Callback { callback, user_data };
    catch_unwind(move || {
        let req = unsafe { &*request };
        let core_req = HttpRequest {
            method: HttpMethod::Get,
            url: req_str(req.url).to_string(),
            headers: Vec::new(),
            query: Vec::new(),
        };
        let transport = Answered(ffi_response_to_core(unsafe { &*response }));
        cdn_core::dispatch::dispatch(
            &transport,
            core_req,
            move |resp| Ok(parse_kind(kind, resp)),
            move |outcome| {
                let result = match outcome {
                    Ok(parsed) => envelope(parsed),
                    Err(err) => FfiResult::from_cdn_error(err),
                };
                completion.invoke(result);
            },
        );
        true
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `cdn_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            for h in headers {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiResult` returned by `cdn_parse`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        for s in [result.message, result.details, result.json] {
            if !s.is_null() {
                drop(unsafe { CString::from_raw(s) });
            }
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn cdn_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::ffi::CString;

    fn new_stack() -> *mut FfiStack {
        let key = CString::new("blt_api_key").unwrap();
        let token = CString::new("cs_token").unwrap();
        let env = CString::new("production").unwrap();
        cdn_stack_new(key.as_ptr(), token.as_ptr(), env.as_ptr(), std::ptr::null())
    }

    fn url_of(req: *mut FfiHttpRequest) -> String {
        let req_ref = unsafe { &*req };
        unsafe { CStr::from_ptr(req_ref.url) }.to_str().unwrap().to_string()
    }

    fn headers_of(req: *mut FfiHttpRequest) -> Vec<(String, String)> {
        let req_ref = unsafe { &*req };
        let headers = unsafe { std::slice::from_raw_parts(req_ref.headers, req_ref.headers_len as usize) };
        headers
            .iter()
            .map(|h| {
                let key = unsafe { CStr::from_ptr(h.key) }.to_str().unwrap().to_string();
                let value = unsafe { CStr::from_ptr(h.value) }.to_str().unwrap().to_string();
                (key, value)
            })
            .collect()
    }

    fn query_of(url: &str) -> Vec<(String, String)> {
        let parsed = url::Url::parse(url).unwrap();
        parsed.query_pairs().into_owned().collect()
    }

    fn parse(kind: FfiResponseKind, status: u16, body: &str) -> *mut FfiResult {
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        cdn_parse(kind, &resp)
    }

    fn json_of(result: *mut FfiResult) -> Value {
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        let raw = unsafe { CStr::from_ptr(r.json) }.to_str().unwrap();
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn stack_new_and_free() {
        let stack = new_stack();
        assert!(!stack.is_null());
        cdn_stack_free(stack);
    }

    #[test]
    fn stack_new_null_or_empty_credentials_return_null() {
        let empty = CString::new("").unwrap();
        let token = CString::new("cs_token").unwrap();
        let env = CString::new("production").unwrap();
        assert!(cdn_stack_new(std::ptr::null(), token.as_ptr(), env.as_ptr(), std::ptr::null()).is_null());
        assert!(cdn_stack_new(empty.as_ptr(), token.as_ptr(), env.as_ptr(), std::ptr::null()).is_null());
    }

    #[test]
    fn stack_free_null_is_safe() {
        cdn_stack_free(std::ptr::null_mut());
    }

    #[test]
    fn custom_host_is_used() {
        let key = CString::new("blt_api_key").unwrap();
        let token = CString::new("cs_token").unwrap();
        let env = CString::new("production").unwrap();
        let host = CString::new("eu-cdn.contentstack.com").unwrap();
        let stack = cdn_stack_new(key.as_ptr(), token.as_ptr(), env.as_ptr(), host.as_ptr());
        let req = cdn_build_content_types(stack, false);
        assert!(url_of(req).starts_with("https://eu-cdn.contentstack.com/v3/content_types?"));
        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn build_entry_carries_credentials_and_locale() {
        let stack = new_stack();
        let ct = CString::new("blog_post").unwrap();
        let uid = CString::new("blt_entry").unwrap();
        let locale = CString::new("fr-fr").unwrap();
        let req = cdn_build_entry(stack, ct.as_ptr(), uid.as_ptr(), locale.as_ptr());
        assert!(!req.is_null());
        assert!(matches!(unsafe { &*req }.method, FfiHttpMethod::Get));

        let url = url_of(req);
        assert!(url.starts_with("https://cdn.contentstack.io/v3/content_types/blog_post/entries/blt_entry?"));
        let query = query_of(&url);
        assert!(query.contains(&("locale".to_string(), "fr-fr".to_string())));
        assert!(query.contains(&("environment".to_string(), "production".to_string())));

        let headers = headers_of(req);
        assert!(headers.contains(&("api_key".to_string(), "blt_api_key".to_string())));
        assert!(headers.contains(&("access_token".to_string(), "cs_token".to_string())));

        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn build_entry_empty_uid_returns_null() {
        let stack = new_stack();
        let ct = CString::new("blog_post").unwrap();
        let uid = CString::new("").unwrap();
        assert!(cdn_build_entry(stack, ct.as_ptr(), uid.as_ptr(), std::ptr::null()).is_null());
        assert!(cdn_build_entry(stack, ct.as_ptr(), std::ptr::null(), std::ptr::null()).is_null());
        cdn_stack_free(stack);
    }

    #[test]
    fn build_with_null_stack_returns_null() {
        assert!(cdn_build_content_types(std::ptr::null(), true).is_null());
        assert!(cdn_build_asset_library(std::ptr::null(), true).is_null());
        assert!(cdn_build_sync(std::ptr::null(), std::ptr::null(), std::ptr::null()).is_null());
    }

    #[test]
    fn entries_query_applies_filter_and_paging() {
        let stack = new_stack();
        let ct = CString::new("blog_post").unwrap();
        let filter = CString::new(r#"{"title":"Hello","price":10}"#).unwrap();
        let req = cdn_build_entries_query(stack, ct.as_ptr(), filter.as_ptr(), 5, -1, true);
        assert!(!req.is_null());

        let query = query_of(&url_of(req));
        let value = |name: &str| {
            query
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(value("query").as_deref(), Some(r#"{"title":"Hello","price":10}"#));
        assert_eq!(value("limit").as_deref(), Some("5"));
        assert_eq!(value("skip"), None);
        assert_eq!(value("include_count").as_deref(), Some("true"));

        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn entries_query_rejects_non_object_filter() {
        let stack = new_stack();
        let ct = CString::new("blog_post").unwrap();
        let filter = CString::new("[1,2]").unwrap();
        assert!(cdn_build_entries_query(stack, ct.as_ptr(), filter.as_ptr(), -1, -1, false).is_null());
        cdn_stack_free(stack);
    }

    #[test]
    fn taxonomy_in_terms_builds_query() {
        let stack = new_stack();
        let field = CString::new("taxonomies.color").unwrap();
        let red = CString::new("red").unwrap();
        let yellow = CString::new("yellow").unwrap();
        let terms = [red.as_ptr(), yellow.as_ptr()];
        let req = cdn_build_taxonomy_query(stack, FfiTaxonomyOp::In, field.as_ptr(), terms.as_ptr(), 2, 0);
        assert!(!req.is_null());

        let url = url_of(req);
        assert!(url.starts_with("https://cdn.contentstack.io/v3/taxonomies/entries?"));
        let query = query_of(&url);
        assert!(query.contains(&(
            "query".to_string(),
            r#"{"taxonomies.color":{"$in":["red","yellow"]}}"#.to_string()
        )));

        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn taxonomy_level_is_embedded_in_term() {
        let stack = new_stack();
        let field = CString::new("taxonomies.color").unwrap();
        let term = CString::new("blue").unwrap();
        let terms = [term.as_ptr()];
        let req =
            cdn_build_taxonomy_query(stack, FfiTaxonomyOp::EqualAndBelow, field.as_ptr(), terms.as_ptr(), 1, 3);
        let query = query_of(&url_of(req));
        assert!(query.contains(&(
            "query".to_string(),
            r#"{"taxonomies.color":{"$eq_below":"blue, level: 3"}}"#.to_string()
        )));
        cdn_free_request(req);

        let missing = cdn_build_taxonomy_query(stack, FfiTaxonomyOp::Above, field.as_ptr(), std::ptr::null(), 0, 0);
        assert!(missing.is_null());
        cdn_stack_free(stack);
    }

    #[test]
    fn every_hierarchy_operator_builds_with_one_term() {
        let stack = new_stack();
        let field = CString::new("taxonomies.color").unwrap();
        let term = CString::new("blue").unwrap();
        let terms = [term.as_ptr()];
        for (op, operator) in [
            (FfiTaxonomyOp::EqualAndBelow, "$eq_below"),
            (FfiTaxonomyOp::Below, "$below"),
            (FfiTaxonomyOp::EqualAbove, "$eq_above"),
            (FfiTaxonomyOp::Above, "$above"),
        ] {
            let req = cdn_build_taxonomy_query(stack, op, field.as_ptr(), terms.as_ptr(), 1, 0);
            assert!(!req.is_null(), "{op:?}");
            let query = query_of(&url_of(req));
            let expected = format!(r#"{{"taxonomies.color":{{"{operator}":"blue"}}}}"#);
            assert!(query.contains(&("query".to_string(), expected)), "{op:?}");
            cdn_free_request(req);
        }
        cdn_stack_free(stack);
    }

    #[test]
    fn taxonomy_exists_builds_query() {
        let stack = new_stack();
        let field = CString::new("taxonomies.color").unwrap();
        let req = cdn_build_taxonomy_exists(stack, field.as_ptr(), false);
        let query = query_of(&url_of(req));
        assert!(query.contains(&(
            "query".to_string(),
            r#"{"taxonomies.color":{"$exists":false}}"#.to_string()
        )));
        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn sync_prefers_pagination_token() {
        let stack = new_stack();
        let sync_token = CString::new("sync_1").unwrap();
        let page = CString::new("page_2").unwrap();
        let req = cdn_build_sync(stack, sync_token.as_ptr(), page.as_ptr());
        let query = query_of(&url_of(req));
        assert!(query.contains(&("pagination_token".to_string(), "page_2".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "sync_token" || k == "init"));
        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn parse_entries_collection_with_count() {
        let result = parse(
            FfiResponseKind::Entries,
            200,
            r#"{"entries":[{"uid":"blt1","title":"First"},{"uid":"blt2"}],"count":2}"#,
        );
        let json = json_of(result);
        assert_eq!(json["entries"][0]["uid"], "blt1");
        assert_eq!(json["entries"][0]["title"], "First");
        assert_eq!(json["count"], 2);
        cdn_free_result(result);
    }

    #[test]
    fn parse_single_asset() {
        let result = parse(
            FfiResponseKind::Asset,
            200,
            r#"{"asset":{"uid":"blt_asset","filename":"hero.png","file_size":"204800"}}"#,
        );
        let json = json_of(result);
        assert_eq!(json["uid"], "blt_asset");
        assert_eq!(json["file_size"], 204800);
        cdn_free_result(result);
    }

    #[test]
    fn parse_api_error_fills_envelope() {
        let result = parse(
            FfiResponseKind::Entry,
            422,
            r#"{"error_message":"The requested entry doesn't exist.","error_code":141,"errors":{"uid":["is not valid."]}}"#,
        );
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Api);
        assert!(r.json.is_null());
        assert_eq!(r.api_error_code, 141);
        assert_eq!(r.http_status, 422);
        let message = unsafe { CStr::from_ptr(r.message) }.to_str().unwrap();
        assert_eq!(message, "The requested entry doesn't exist.");
        let details = unsafe { CStr::from_ptr(r.details) }.to_str().unwrap();
        assert!(details.contains("uid"));
        cdn_free_result(result);
    }

    #[test]
    fn parse_transport_failure() {
        let result = parse(FfiResponseKind::ContentTypes, 0, "connection refused");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Transport);
        let message = unsafe { CStr::from_ptr(r.message) }.to_str().unwrap();
        assert_eq!(message, "connection refused");
        cdn_free_result(result);
    }

    #[test]
    fn parse_asset_list_shape_error_names_field() {
        let result = parse(FfiResponseKind::Assets, 200, r#"{"assets":"oops"}"#);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Shape);
        let details = unsafe { CStr::from_ptr(r.details) }.to_str().unwrap();
        assert_eq!(details, "assets");
        cdn_free_result(result);
    }

    #[test]
    fn parse_non_json_success_body() {
        let result = parse(FfiResponseKind::Sync, 200, "not json");
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Deserialization);
        cdn_free_result(result);
    }

    #[test]
    fn parse_null_response_is_reported() {
        let result = cdn_parse(FfiResponseKind::Entry, std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::NullArg);
        cdn_free_result(result);
    }

    struct Seen {
        calls: u32,
        code: Option<FfiErrorCode>,
        json: Option<Value>,
    }

    extern "C" fn record(user_data: *mut c_void, result: *const FfiResult) {
        let seen = unsafe { &mut *(user_data as *mut Seen) };
        let r = unsafe { &*result };
        seen.calls += 1;
        seen.code = Some(r.error_code);
        if !r.json.is_null() {
            let raw = unsafe { CStr::from_ptr(r.json) }.to_str().unwrap();
            seen.json = serde_json::from_str(raw).ok();
        }
    }

    #[test]
    fn complete_invokes_callback_once() {
        let stack = new_stack();
        let req = cdn_build_asset_library(stack, true);
        let body = CString::new(r#"{"assets":[{"uid":"blt_a"}],"count":1}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let mut seen = Seen {
            calls: 0,
            code: None,
            json: None,
        };
        let ok = cdn_complete(
            req,
            FfiResponseKind::Assets,
            &resp,
            record,
            &mut seen as *mut Seen as *mut c_void,
        );
        assert!(ok);
        assert_eq!(seen.calls, 1);
        assert_eq!(seen.code, Some(FfiErrorCode::Ok));
        assert_eq!(seen.json.unwrap()["assets"][0]["uid"], "blt_a");
        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    #[test]
    fn complete_delivers_errors_through_callback() {
        let stack = new_stack();
        let req = cdn_build_content_types(stack, false);
        let body = CString::new(r#"{"error_message":"Access denied","error_code":412}"#).unwrap();
        let resp = FfiHttpResponse {
            status: 401,
            body: body.as_ptr(),
        };
        let mut seen = Seen {
            calls: 0,
            code: None,
            json: None,
        };
        assert!(cdn_complete(
            req,
            FfiResponseKind::ContentTypes,
            &resp,
            record,
            &mut seen as *mut Seen as *mut c_void,
        ));
        assert_eq!(seen.calls, 1);
        assert_eq!(seen.code, Some(FfiErrorCode::Api));
        assert!(seen.json.is_none());
        cdn_free_request(req);
        cdn_stack_free(stack);
    }

    fn complete_with(kind: FfiResponseKind, status: u16, body: &str) -> Seen {
        let stack = new_stack();
        let req = cdn_build_asset_library(stack, false);
        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        let mut seen = Seen {
            calls: 0,
            code: None,
            json: None,
        };
        assert!(cdn_complete(req, kind, &resp, record, &mut seen as *mut Seen as *mut c_void));
        cdn_free_request(req);
        cdn_stack_free(stack);
        seen
    }

    #[test]
    fn complete_separates_transport_from_local_errors() {
        let transport = complete_with(FfiResponseKind::Assets, 0, "connection reset");
        assert_eq!(transport.calls, 1);
        assert_eq!(transport.code, Some(FfiErrorCode::Transport));

        let shape = complete_with(FfiResponseKind::Assets, 200, r#"{"assets":"oops"}"#);
        assert_eq!(shape.calls, 1);
        assert_eq!(shape.code, Some(FfiErrorCode::Shape));

        let decode = complete_with(FfiResponseKind::Sync, 200, "not json");
        assert_eq!(decode.code, Some(FfiErrorCode::Deserialization));
    }

    #[test]
    fn complete_maps_null_entry_to_empty_model() {
        let seen = complete_with(FfiResponseKind::Entry, 200, r#"{"entry":null}"#);
        assert_eq!(seen.code, Some(FfiErrorCode::Ok));
        assert_eq!(seen.json.unwrap()["uid"], Value::Null);
    }

    #[test]
    fn complete_with_null_request_skips_callback() {
        let body = CString::new("{}").unwrap();
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let mut seen = Seen {
            calls: 0,
            code: None,
            json: None,
        };
        let ok = cdn_complete(
            std::ptr::null(),
            FfiResponseKind::Entry,
            &resp,
            record,
            &mut seen as *mut Seen as *mut c_void,
        );
        assert!(!ok);
        assert_eq!(seen.calls, 0);
    }

    #[test]
    fn free_functions_accept_null() {
        cdn_free_request(std::ptr::null_mut());
        cdn_free_result(std::ptr::null_mut());
        cdn_free_string(std::ptr::null_mut());
    }
}
