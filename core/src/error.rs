//! Error types for the delivery client.
//!
//! # Design
//! Errors are split by when they surface:
//! - `ConfigError` is returned synchronously while building a stack or a
//!   request, before anything reaches a transport.
//! - `ShapeError` is returned synchronously from `parse` when a response
//!   field has a type the API contract forbids.
//! - `CdnError` is the uniform value handed to completion callbacks. It is
//!   built from non-2xx bodies, transport failures, and (when parsing runs
//!   inside the dispatcher) from the two errors above.
//!
//! `ApiError` is what the `parse` half of every builder returns.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Message used when an error body carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// A required credential or identifier is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// A response field is present but has a type the contract forbids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("Invalid type for '{field}' key. Provide {field} as a List or ArrayList and try again.")]
    NotAList { field: String, found: &'static str },
}

impl ShapeError {
    pub fn field(&self) -> &str {
        match self {
            ShapeError::NotAList { field, .. } => field,
        }
    }
}

/// Where a [`CdnError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The API answered with a non-2xx status.
    Api,
    /// No answer arrived (status `0`).
    Transport,
    /// A 2xx body had a field of a forbidden type; `details` names it.
    Shape,
    /// A 2xx body was not JSON.
    Deserialization,
}

/// Uniform error value delivered through completion callbacks.
///
/// `kind` tells transport failures apart from errors raised locally while
/// parsing, which share status `0`. `message` is never empty. `code` is the API's `error_code`, or `0` when
/// none was supplied. `status` is the HTTP status, `0` for transport
/// failures and for errors raised locally while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message} (code {code})")]
pub struct CdnError {
    pub kind: ErrorKind,
    pub message: String,
    pub code: i64,
    pub details: Option<String>,
    pub status: u16,
}

impl CdnError {
    /// Parse an error body returned with a non-2xx status.
    ///
    /// A JSON body contributes `error_message`, `error_code` and `errors`;
    /// anything else is kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => {
                let message = map
                    .get("error_message")
                    .and_then(Value::as_str)
                    .filter(|m| !m.is_empty())
                    .unwrap_or(UNKNOWN_ERROR_MESSAGE)
                    .to_string();
                let code = map.get("error_code").and_then(Value::as_i64).unwrap_or(0);
                let details = map.get("errors").map(|errors| match errors {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                Self {
                    kind: ErrorKind::from_status(status),
                    message,
                    code,
                    details,
                    status,
                }
            }
            _ => Self::plain(status, body),
        }
    }

    fn plain(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            body.to_string()
        };
        Self {
            kind: ErrorKind::from_status(status),
            message,
            code: 0,
            details: None,
            status,
        }
    }
}

impl ErrorKind {
    fn from_status(status: u16) -> Self {
        if status == 0 {
            ErrorKind::Transport
        } else {
            ErrorKind::Api
        }
    }
}

/// Errors returned by the `parse` half of a builder.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport failed or the API answered with a non-2xx status.
    #[error(transparent)]
    Response(CdnError),

    /// A field had a forbidden type.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// A 2xx body was not JSON.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl From<ApiError> for CdnError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Response(e) => e,
            ApiError::Shape(e) => CdnError {
                kind: ErrorKind::Shape,
                message: e.to_string(),
                code: 0,
                details: Some(e.field().to_string()),
                status: 0,
            },
            ApiError::Deserialization(msg) => CdnError {
                kind: ErrorKind::Deserialization,
                message: format!("deserialization failed: {msg}"),
                code: 0,
                details: None,
                status: 0,
            },
        }
    }
}
