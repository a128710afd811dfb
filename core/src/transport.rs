//! The request transport collaborator.
//!
//! The core does not ship an HTTP client. Anything that can execute an
//! [`HttpRequest`] and eventually report an [`HttpResponse`] can drive the
//! builders: an async client on a runtime, a blocking client on a worker
//! thread, or a canned responder in tests.

use crate::http::{HttpRequest, HttpResponse};

/// Receives the outcome of one request. Called at most once.
pub type Responder = Box<dyn FnOnce(HttpResponse) + Send + 'static>;

pub trait Transport: Send + Sync {
    /// Execute `request` and pass the outcome to `respond`, on any thread.
    ///
    /// Transport failures are reported as a response with status `0` and the
    /// failure text as body (see [`HttpResponse::transport_failure`]). An
    /// implementation must call `respond` exactly once.
    fn send(&self, request: HttpRequest, respond: Responder);
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: HttpRequest, respond: Responder) {
        (**self).send(request, respond)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: HttpRequest, respond: Responder) {
        (**self).send(request, respond)
    }
}
