//! Error type carried through the error-logging path.
//!
//! # Design
//! - Mirrors what the error record needs: message, name, trace, code, signal, status, request id.
//! - Causes are kept as a linked chain and exposed through `std::error::Error::source`.
//! - Converting into a response leaves the error in the response extensions so the
//!   error-logging layer (and anything outside it) can still see it.

use std::any::type_name;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::iter::successors;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqlog_telemetry::RequestId;
use serde::Serialize;

use crate::unwind::MAX_CAUSE_DEPTH;

const HTTP_ERROR_NAME: &str = "HttpError";
const SOURCE_ERROR_NAME: &str = "Error";

/// An error raised while serving a request.
///
/// The serialized form is the raw error: it omits `stack` once the trace has been redacted and
/// never includes the cause chain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestError {
    message: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    code: Option<String>,
    signal: Option<String>,
    status: Option<u16>,
    request_id: Option<RequestId>,
    #[serde(skip)]
    cause: Option<Box<RequestError>>,
}

impl RequestError {
    /// Create an error and capture a trace at the call site.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = Some(capture_stack(&name, &message));
        Self {
            message,
            name,
            stack,
            code: None,
            signal: None,
            status: None,
            request_id: None,
            cause: None,
        }
    }

    /// Error describing an HTTP status, e.g. a 404 for an unmatched route.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(
            HTTP_ERROR_NAME,
            status.canonical_reason().unwrap_or("Unknown Status"),
        )
        .with_status(status)
    }

    /// Wrap any error, naming it after its type and converting its `source()` chain into causes.
    #[must_use]
    pub fn from_error<E>(err: &E) -> Self
    where
        E: Error + 'static,
    {
        let mut wrapped = Self::new(short_type_name::<E>(), err.to_string());
        wrapped.cause = cause_chain(err.source());
        wrapped
    }

    /// Attach an HTTP status.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }

    /// Attach a machine-readable error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the signal that terminated a child process, when relevant.
    #[must_use]
    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = Some(signal.into());
        self
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Error name (usually the originating type).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trace captured for this error, if it has not been redacted.
    #[must_use]
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Terminating signal name.
    #[must_use]
    pub fn signal(&self) -> Option<&str> {
        self.signal.as_deref()
    }

    /// HTTP status attached to the error itself.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Identifier of the request the error belongs to.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Underlying cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    pub(crate) fn set_request_id(&mut self, request_id: Option<RequestId>) {
        self.request_id = request_id;
    }

    pub(crate) fn redact_stack(&mut self) {
        self.stack = None;
    }
}

impl Display for RequestError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.name, self.message)
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self
            .status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

fn capture_stack(name: &str, message: &str) -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("{name}: {message}\n{backtrace}"),
        _ => format!("{name}: {message}"),
    }
}

fn cause_chain(source: Option<&(dyn Error + 'static)>) -> Option<Box<RequestError>> {
    let levels: Vec<RequestError> = successors(source, |&err| err.source())
        .take(MAX_CAUSE_DEPTH)
        .map(cause_level)
        .collect();
    levels.into_iter().rev().fold(None, |cause, mut level| {
        level.cause = cause;
        Some(Box::new(level))
    })
}

fn cause_level(err: &(dyn Error + 'static)) -> RequestError {
    err.downcast_ref::<RequestError>().map_or_else(
        || RequestError {
            message: err.to_string(),
            name: SOURCE_ERROR_NAME.to_string(),
            stack: None,
            code: None,
            signal: None,
            status: None,
            request_id: None,
            cause: None,
        },
        |inner| RequestError {
            cause: None,
            ..inner.clone()
        },
    )
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
