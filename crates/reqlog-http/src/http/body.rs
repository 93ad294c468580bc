//! Response completion tracking.
//!
//! # Design
//! - [`Completion`] logs the response record exactly once, from whichever terminal event
//!   happens first: end of body, body error, or being dropped (client abort, failed handler).
//! - [`TrackedBody`] carries the completion alongside the response body so the record is
//!   written after the last frame has been handed to the server.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::response::Response;
use http_body::{Body as HttpBody, Frame, SizeHint};
use reqlog_telemetry::RequestId;

use crate::http::context::elapsed_ms;
use crate::logger::RequestLogger;
use crate::serializers::{ResponseView, header_block};

/// One-shot response record for a single request.
pub(crate) struct Completion {
    logger: RequestLogger,
    request_id: RequestId,
    started_at: Instant,
    status_code: Option<u16>,
    headers: String,
    fired: bool,
}

impl Completion {
    pub(crate) const fn new(logger: RequestLogger, request_id: RequestId, started_at: Instant) -> Self {
        Self {
            logger,
            request_id,
            started_at,
            status_code: None,
            headers: String::new(),
            fired: false,
        }
    }

    /// Remember the status line and headers about to be sent.
    pub(crate) fn observe(&mut self, response: &Response) {
        self.status_code = Some(response.status().as_u16());
        self.headers = header_block(response.status(), response.version(), response.headers());
    }

    pub(crate) fn fire(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        let view = ResponseView {
            status_code: self.status_code,
            headers: std::mem::take(&mut self.headers),
            request_id: Some(self.request_id.clone()),
            response_time: elapsed_ms(self.started_at),
        };
        self.logger.log_response(&view);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Response body that fires its [`Completion`] when the stream ends.
pub(crate) struct TrackedBody {
    inner: Body,
    completion: Option<Completion>,
}

impl TrackedBody {
    pub(crate) const fn new(inner: Body, completion: Completion) -> Self {
        Self {
            inner,
            completion: Some(completion),
        }
    }

    fn finish(&mut self) {
        if let Some(mut completion) = self.completion.take() {
            completion.fire();
        }
    }
}

impl HttpBody for TrackedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        if matches!(polled, Poll::Ready(None | Some(Err(_)))) {
            self.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
