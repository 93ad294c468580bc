use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use reqlog_http::{RequestError, RequestLogger, no_cache_layer};

const GREETING: &str = "Hello, World!";
const SLOW_RESPONSE_DELAY: Duration = Duration::from_millis(100);

/// Demo router: plain, slow and failing routes plus the tracking pixel.
///
/// Unmatched paths become 404 errors so they reach the error log. Both logging layers wrap
/// everything, the request layer outermost.
#[must_use]
pub fn router(logger: &RequestLogger) -> Router {
    Router::new()
        .route("/something", get(something))
        .route("/slow-response", get(slow_response))
        .route("/error", get(failing))
        .route("/log.gif", logger.pixel_route().layer(no_cache_layer()))
        .route(
            "/log.gif/{msg}",
            logger.pixel_route().layer(no_cache_layer()),
        )
        .fallback(not_found)
        .layer(logger.error_layer())
        .layer(logger.request_layer())
}

async fn something() -> &'static str {
    GREETING
}

async fn slow_response() -> &'static str {
    tokio::time::sleep(SLOW_RESPONSE_DELAY).await;
    GREETING
}

async fn failing() -> Result<&'static str, RequestError> {
    Err(RequestError::new("Error", "Sample error"))
}

async fn not_found() -> RequestError {
    RequestError::from_status(StatusCode::NOT_FOUND)
}
