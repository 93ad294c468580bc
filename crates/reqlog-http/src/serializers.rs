//! Record shapes for the `req`, `res`, and `err` payload keys.
//!
//! # Design
//! - Each serializer emits a fixed, minimal key set so records keep a stable schema and never
//!   leak fields nobody asked for.
//! - Serializers are total: absent input yields `null`, and input that is not a proper
//!   request/error (no transport info, no trace) is passed through in its raw form.
//! - Optional values are written as `null` rather than skipped, so the key set never varies.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode, Version};
use reqlog_telemetry::RequestId;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::RequestError;
use crate::http::constants::HEADER_FORWARDED_FOR;
use crate::http::context::RequestContext;
use crate::unwind::full_stack;

/// Snapshot of an inbound request as seen by the logger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    /// Path and query of the request target.
    pub url: String,
    /// HTTP method.
    pub method: String,
    /// `http` or `https`.
    pub protocol: String,
    /// Incoming headers, lower-case names; repeated headers joined with `", "`.
    pub headers: BTreeMap<String, String>,
    /// Transport-level peer address, when the host exposes one.
    pub remote_addr: Option<SocketAddr>,
    /// Identifier assigned by the request logger.
    pub request_id: Option<RequestId>,
}

impl RequestView {
    /// Capture the loggable parts of a request.
    ///
    /// The peer address comes from axum's `ConnectInfo<SocketAddr>` extension and the identifier
    /// from the [`RequestContext`] extension.
    #[must_use]
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request.uri();
        Self {
            url: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), |target| target.as_str().to_string()),
            method: request.method().as_str().to_string(),
            protocol: uri.scheme_str().unwrap_or("http").to_string(),
            headers: header_map(request.headers()),
            remote_addr: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            request_id: request
                .extensions()
                .get::<RequestContext>()
                .map(|context| context.request_id().clone()),
        }
    }

    /// Client address: the forwarded-for header when present, else the peer address.
    #[must_use]
    pub fn client_ip(&self) -> Option<String> {
        self.headers
            .get(HEADER_FORWARDED_FOR)
            .cloned()
            .or_else(|| self.remote_addr.map(|addr| addr.ip().to_string()))
    }
}

/// Snapshot of a finished response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseView {
    /// Status sent to the client; absent when the request ended before a response existed.
    pub status_code: Option<u16>,
    /// Outgoing header block as written on the wire.
    pub headers: String,
    /// Identifier copied from the request.
    pub request_id: Option<RequestId>,
    /// Milliseconds between the logger seeing the request and the response finishing.
    pub response_time: u64,
}

/// Serialize a request into `url`, `method`, `protocol`, `requestId`, `ip`, `headers`.
#[must_use]
pub fn req(request: Option<&RequestView>) -> Value {
    let Some(request) = request else {
        return Value::Null;
    };
    if request.remote_addr.is_none() {
        return raw(request);
    }
    json!({
        "url": request.url,
        "method": request.method,
        "protocol": request.protocol,
        "requestId": request.request_id,
        "ip": request.client_ip(),
        "headers": request.headers,
    })
}

/// Serialize a response into `statusCode`, `headers`, `requestId`, `responseTime`.
#[must_use]
pub fn res(response: Option<&ResponseView>) -> Value {
    let Some(response) = response else {
        return Value::Null;
    };
    json!({
        "statusCode": response.status_code,
        "headers": response.headers,
        "requestId": response.request_id,
        "responseTime": response.response_time,
    })
}

/// Serialize an error into `message`, `name`, `stack`, `code`, `signal`, `requestId`.
///
/// `stack` is the full trace including causes. Errors without a trace are passed through raw.
#[must_use]
pub fn err(error: Option<&RequestError>) -> Value {
    let Some(error) = error else {
        return Value::Null;
    };
    if error.stack().is_none() {
        return raw(error);
    }
    json!({
        "message": error.message(),
        "name": error.name(),
        "stack": full_stack(error),
        "code": error.code(),
        "signal": error.signal(),
        "requestId": error.request_id(),
    })
}

fn raw<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub(crate) fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), joined)
        })
        .collect()
}

pub(crate) fn header_block(status: StatusCode, version: Version, headers: &HeaderMap) -> String {
    let mut block = format!(
        "{version:?} {} {}\r\n",
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );
    for (name, value) in headers {
        block.push_str(name.as_str());
        block.push_str(": ");
        block.push_str(&String::from_utf8_lossy(value.as_bytes()));
        block.push_str("\r\n");
    }
    block.push_str("\r\n");
    block
}
