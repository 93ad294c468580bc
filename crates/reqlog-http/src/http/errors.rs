//! Error correlation middleware.
//!
//! # Design
//! - Handler errors travel as [`RequestError`] values in the response extensions.
//! - The layer takes the error out, tags it with the request identifier, applies the
//!   redaction policy, logs it once, and puts it back so outer layers still see it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::http::Request;
use axum::response::Response;
use tower::{Layer, Service};

use crate::error::RequestError;
use crate::http::context::RequestContext;
use crate::logger::RequestLogger;

/// Logs errors produced by the wrapped service, correlated with their request.
#[derive(Clone)]
pub struct ErrorLoggerLayer {
    logger: RequestLogger,
}

impl ErrorLoggerLayer {
    /// Construct the layer around a logger handle.
    #[must_use]
    pub const fn new(logger: RequestLogger) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for ErrorLoggerLayer {
    type Service = ErrorLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorLoggerService {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Service produced by [`ErrorLoggerLayer`].
#[derive(Clone)]
pub struct ErrorLoggerService<S> {
    inner: S,
    logger: RequestLogger,
}

impl<S, B> Service<Request<B>> for ErrorLoggerService<S>
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

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let context = req.extensions().get::<RequestContext>().cloned();
        let logger = self.logger.clone();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.await?;
            if let Some(err) = response.extensions_mut().remove::<RequestError>() {
                let err = logger.observe_error(err, context.as_ref(), Some(response.status()));
                response.extensions_mut().insert(err);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerOptions;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use reqlog_telemetry::RequestId;
    use reqlog_test_support::{RecordingSink, get_request};
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::time::Instant;
    use tower::ServiceExt;
    use tower::service_fn;

    fn service_returning(
        sink: &Arc<RecordingSink>,
        make: fn() -> Response,
    ) -> impl Service<Request<Body>, Response = Response, Error = Infallible> {
        let logger = RequestLogger::with_sink(LoggerOptions::default(), sink.clone());
        ErrorLoggerLayer::new(logger)
            .layer(service_fn(move |_req: Request<Body>| async move { Ok::<_, Infallible>(make()) }))
    }

    fn with_context(mut req: Request<Body>) -> Request<Body> {
        req.extensions_mut()
            .insert(RequestContext::new(RequestId::new("req-7"), Instant::now()));
        req
    }

    #[tokio::test]
    async fn server_errors_are_logged_once_with_stack_and_request_id() -> anyhow::Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let service = service_returning(&sink, || {
            RequestError::new("Error", "Sample error").into_response()
        });

        let response = service.oneshot(with_context(get_request("/error")?)).await?;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        let err = &errors[0].payload["err"];
        assert_eq!(err["requestId"], "req-7");
        assert!(err["stack"].as_str().is_some());

        let carried = response.extensions().get::<RequestError>();
        assert_eq!(
            carried.and_then(RequestError::request_id).map(RequestId::as_str),
            Some("req-7")
        );
        Ok(())
    }

    #[tokio::test]
    async fn client_errors_lose_their_stack_before_logging() -> anyhow::Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let service = service_returning(&sink, || {
            RequestError::from_status(StatusCode::NOT_FOUND).into_response()
        });

        let response = service.oneshot(with_context(get_request("/missing")?)).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].payload["err"].get("stack").is_none());
        assert_eq!(errors[0].payload["err"]["requestId"], "req-7");
        Ok(())
    }

    #[tokio::test]
    async fn plain_responses_are_not_logged() -> anyhow::Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let service = service_returning(&sink, || StatusCode::NOT_FOUND.into_response());

        service.oneshot(get_request("/plain")?).await?;
        assert!(sink.records().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_context_leaves_request_id_empty() -> anyhow::Result<()> {
        let sink = Arc::new(RecordingSink::new());
        let service = service_returning(&sink, || {
            RequestError::new("Error", "early").into_response()
        });

        service.oneshot(get_request("/early")?).await?;
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].payload["err"]["requestId"].is_null());
        Ok(())
    }
}
