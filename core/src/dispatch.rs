//! Callback dispatch for one logical operation.
//!
//! `dispatch` hands a request to the transport and, when the transport
//! answers, runs the operation's parser and invokes the completion exactly
//! once with either the typed result or a [`CdnError`]. Parsing happens on
//! whatever thread the transport responds from.

use tracing::{debug, warn};

use crate::error::{ApiError, CdnError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// The single completion type shared by every operation.
pub type Completion<T> = Box<dyn FnOnce(Result<T, CdnError>) + Send + 'static>;

pub fn dispatch<T, P, F>(transport: &dyn Transport, request: HttpRequest, parse: P, on_complete: F)
where
    T: 'static,
    P: FnOnce(HttpResponse) -> Result<T, ApiError> + Send + 'static,
    F: FnOnce(Result<T, CdnError>) + Send + 'static,
{
    let url = request.url.clone();
    debug!(method = request.method.as_str(), %url, "dispatching request");
    transport.send(
        request,
        Box::new(move |response| {
            let status = response.status;
            let outcome = parse(response).map_err(CdnError::from);
            match &outcome {
                Ok(_) => debug!(%url, status, "request completed"),
                Err(err) => warn!(%url, status, code = err.code, message = %err.message, "request failed"),
            }
            on_complete(outcome);
        }),
    );
}

/// Common first step of every parser: reject non-2xx responses and decode
/// the JSON body.
pub(crate) fn json_body(response: &HttpResponse) -> Result<serde_json::Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::Response(CdnError::from_response(
            response.status,
            &response.body,
        )));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::mpsc;
    use std::sync::Mutex;

    use super::*;
    use crate::transport::Responder;

    /// Answers every request with a fixed response on a fresh thread and
    /// records the requests it saw.
    pub struct CannedTransport {
        pub response: HttpResponse,
        pub seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        pub fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for CannedTransport {
        fn send(&self, request: HttpRequest, respond: Responder) {
            self.seen.lock().unwrap().push(request);
            let response = self.response.clone();
            std::thread::spawn(move || respond(response));
        }
    }

    /// Run `op` with a completion that forwards into a channel, and wait for
    /// exactly one result.
    pub fn await_one<T, O>(op: O) -> Result<T, CdnError>
    where
        T: Send + 'static,
        O: FnOnce(Completion<T>),
    {
        let (tx, rx) = mpsc::channel();
        op(Box::new(move |result| {
            tx.send(result).unwrap();
        }));
        let result = rx.recv().unwrap();
        assert!(rx.recv().is_err(), "completion fired more than once");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{await_one, CannedTransport};
    use super::*;
    use crate::error::UNKNOWN_ERROR_MESSAGE;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "https://cdn.example.com/v3/assets".to_string(),
            headers: Vec::new(),
            query: Vec::new(),
        }
    }

    fn parse_title(response: HttpResponse) -> Result<String, ApiError> {
        let body = json_body(&response)?;
        Ok(body["title"].as_str().unwrap_or_default().to_string())
    }

    #[test]
    fn success_reaches_completion() {
        let transport = CannedTransport::new(200, r#"{"title":"ok"}"#);
        let result: Result<String, CdnError> =
            await_one(|done| dispatch(&transport, request(), parse_title, done));
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn api_error_body_is_translated() {
        let transport = CannedTransport::new(
            422,
            r#"{"error_message":"Entry not found","error_code":141}"#,
        );
        let err = await_one::<String, _>(|done| dispatch(&transport, request(), parse_title, done)).unwrap_err();
        assert_eq!(err.message, "Entry not found");
        assert_eq!(err.code, 141);
        assert_eq!(err.status, 422);
    }

    #[test]
    fn transport_failure_has_status_zero() {
        let transport = CannedTransport::new(0, "connection refused");
        let err = await_one::<String, _>(|done| dispatch(&transport, request(), parse_title, done)).unwrap_err();
        assert_eq!(err.status, 0);
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "connection refused");
    }

    #[test]
    fn empty_error_body_gets_placeholder_message() {
        let transport = CannedTransport::new(503, "");
        let err = await_one::<String, _>(|done| dispatch(&transport, request(), parse_title, done)).unwrap_err();
        assert_eq!(err.message, UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn malformed_success_body_is_an_error() {
        let transport = CannedTransport::new(200, "<html>");
        let err = await_one::<String, _>(|done| dispatch(&transport, request(), parse_title, done)).unwrap_err();
        assert!(err.message.starts_with("deserialization failed"));
    }
}
