//! Request fixtures and deterministic identifiers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{self, Method, Request};
use reqlog_telemetry::{IdGenerator, RequestId};

/// Peer address attached to fixture requests.
pub const TEST_PEER: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
    40_000,
);

/// Build a `GET` request that looks like it arrived over a real connection.
///
/// # Errors
///
/// Returns an error if `uri` is not a valid request target.
pub fn get_request(uri: &str) -> Result<Request<Body>, http::Error> {
    request_with_headers(Method::GET, uri, &[])
}

/// Build a request with the given method and headers, carrying [`TEST_PEER`] as connect info.
///
/// # Errors
///
/// Returns an error if `uri` or any header is invalid.
pub fn request_with_headers(
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> Result<Request<Body>, http::Error> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(TEST_PEER));
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty())
}

/// Identifier generator yielding `{prefix}-1`, `{prefix}-2`, ...
#[derive(Debug)]
pub struct SequentialIds {
    prefix: &'static str,
    next: AtomicU64,
}

impl SequentialIds {
    /// Start a new sequence.
    #[must_use]
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> RequestId {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        RequestId::new(format!("{}-{value}", self.prefix))
    }
}
