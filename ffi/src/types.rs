//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Parsed models cross the
//! boundary as JSON text so one envelope serves every entity kind.
//! Conversion functions live here to keep `lib.rs` focused on the
//! `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use cdn_core::error::{ApiError, CdnError, ErrorKind};
use cdn_core::http::HttpMethod;

/// Opaque handle to a `Stack`. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiStack {
    pub(crate) inner: cdn_core::Stack,
}

/// Copy `s` into a C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s: String = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum. The delivery API is read-only.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `cdn_build_*` functions. `url` already carries the encoded
/// query string. The C caller executes the request and passes the response
/// back through `cdn_parse` or `cdn_complete`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: cdn_core::HttpRequest) -> *mut Self {
        let url = c_string(req.full_url());

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Vec<FfiHeader> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            // Exact capacity so `cdn_free_request` can rebuild the Vec.
            Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this after executing a request; status `0`
/// reports a transport failure with the failure text as `body`. The FFI
/// layer reads but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Which operation a response answers, selecting the parser.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiResponseKind {
    Entry = 0,
    Entries = 1,
    Asset = 2,
    Assets = 3,
    ContentType = 4,
    ContentTypes = 5,
    GlobalField = 6,
    GlobalFields = 7,
    Taxonomy = 8,
    Sync = 9,
}

/// Taxonomy operator selected by `cdn_build_taxonomy_query`. Presence
/// tests go through `cdn_build_taxonomy_exists`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTaxonomyOp {
    In = 0,
    EqualAndBelow = 1,
    Below = 2,
    EqualAbove = 3,
    Above = 4,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error categories returned in `FfiResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The API answered with a non-2xx status.
    Api = 1,
    /// The request never got an answer (status 0).
    Transport = 2,
    /// A response field had a forbidden type; `details` names it.
    Shape = 3,
    Deserialization = 4,
    Serialization = 5,
    Panic = 6,
    NullArg = 7,
}

/// Result envelope for parse operations.
///
/// On success `error_code` is `Ok`, the error fields are null/zero, and
/// `json` holds the mapped model. On failure `json` is null, `message` is
/// never null, and `api_error_code`, `details` and `http_status` carry
/// whatever the error supplied.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub message: *mut c_char,
    pub api_error_code: i64,
    pub details: *mut c_char,
    pub http_status: u16,
    pub json: *mut c_char,
}

/// Completion invoked by `cdn_complete`. `result` is only valid for the
/// duration of the call.
pub type FfiCallback = extern "C" fn(user_data: *mut c_void, result: *const FfiResult);

impl FfiResult {
    fn boxed(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    /// Build a success result carrying `json`.
    pub(crate) fn ok(json: String) -> *mut Self {
        FfiResult {
            error_code: FfiErrorCode::Ok,
            message: std::ptr::null_mut(),
            api_error_code: 0,
            details: std::ptr::null_mut(),
            http_status: 0,
            json: c_string(json),
        }
        .boxed()
    }

    fn failure(error_code: FfiErrorCode, message: String) -> Self {
        FfiResult {
            error_code,
            message: c_string(message),
            api_error_code: 0,
            details: std::ptr::null_mut(),
            http_status: 0,
            json: std::ptr::null_mut(),
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::from_cdn_error(err.into())
    }

    /// Build an error result from a completion error, categorized by its kind.
    pub(crate) fn from_cdn_error(err: CdnError) -> *mut Self {
        let code = match err.kind {
            ErrorKind::Api => FfiErrorCode::Api,
            ErrorKind::Transport => FfiErrorCode::Transport,
            ErrorKind::Shape => FfiErrorCode::Shape,
            ErrorKind::Deserialization => FfiErrorCode::Deserialization,
        };
        let mut result = Self::failure(code, err.message);
        result.api_error_code = err.code;
        result.http_status = err.status;
        if let Some(details) = err.details {
            result.details = c_string(details);
        }
        result.boxed()
    }

    pub(crate) fn serialization(msg: String) -> *mut Self {
        Self::failure(FfiErrorCode::Serialization, msg).boxed()
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}")).boxed()
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string()).boxed()
    }
}
