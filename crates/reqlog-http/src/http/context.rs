//! Request-scoped correlation context.
//!
//! # Design
//! - Created once per request by the request logger and stored in the request extensions.
//! - Handlers can extract it directly, or as `Option<RequestContext>` when the logger may be absent.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{StatusCode, request::Parts};
use reqlog_telemetry::RequestId;

use crate::error::RequestError;

/// Identifier and start time of the request being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    started_at: Instant,
}

impl RequestContext {
    /// Build a context for a request that started at `started_at`.
    #[must_use]
    pub const fn new(request_id: RequestId, started_at: Instant) -> Self {
        Self {
            request_id,
            started_at,
        }
    }

    /// Identifier assigned to the request.
    #[must_use]
    pub const fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Instant the request logger first saw the request.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Whole milliseconds since the request started.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        elapsed_ms(self.started_at)
    }
}

pub(crate) fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().cloned().ok_or_else(|| {
            RequestError::new("MissingRequestContext", "request logger layer is not installed")
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }
}

impl<S> OptionalFromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned())
    }
}
