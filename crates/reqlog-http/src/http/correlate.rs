//! Request/response correlation middleware.
use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::Response;
use reqlog_telemetry::{request_span, with_request_context};
use tower::{Layer, Service};
use tracing::Instrument;

use crate::http::body::{Completion, TrackedBody};
use crate::http::constants::HEADER_REQUEST_ID;
use crate::http::context::RequestContext;
use crate::logger::RequestLogger;
use crate::serializers::RequestView;

/// Assigns each request an identifier and logs the request and its response under it.
///
/// The request record is written before the inner service runs. The response record is
/// written once the response body has been fully sent, or when the request is abandoned,
/// whichever comes first.
#[derive(Clone)]
pub struct RequestLoggerLayer {
    logger: RequestLogger,
}

impl RequestLoggerLayer {
    /// Construct the layer around a logger handle.
    #[must_use]
    pub const fn new(logger: RequestLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Service produced by [`RequestLoggerLayer`].
#[derive(Clone)]
pub struct RequestLoggerService<S> {
    inner: S,
    logger: RequestLogger,
}

impl<S, B> Service<Request<B>> for RequestLoggerService<S>
where
    S: Service<Request<B>, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let started_at = Instant::now();
        let request_id = self.logger.next_request_id();
        req.extensions_mut()
            .insert(RequestContext::new(request_id.clone(), started_at));

        self.logger.log_request(&RequestView::from_request(&req));

        let span = request_span(&request_id, req.method().as_str(), req.uri().path());
        let mut completion = Completion::new(self.logger.clone(), request_id.clone(), started_at);
        let header = HeaderValue::from_str(request_id.as_str()).ok();
        let fut = self.inner.call(req);

        Box::pin(
            with_request_context(request_id, async move {
                let mut response = fut.await?;
                if let Some(value) = header {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
                }
                completion.observe(&response);
                Ok(response.map(|body| Body::new(TrackedBody::new(body, completion))))
            })
            .instrument(span),
        )
    }
}
