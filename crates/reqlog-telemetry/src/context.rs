//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - Keeps the request identifier in task-local storage so downstream code can read it.
//! - Provides an application-level span guard so top-level spans carry the app name.

use std::future::Future;

use tracing::{Span, span::Entered};

use crate::id::RequestId;
use crate::init::app_name;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    /// Enter the application-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new() -> Self {
        let span: &'static Span =
            Box::leak(Box::new(tracing::info_span!("app", name = %app_name())));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

impl Default for GlobalContextGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the diagnostic span that wraps one request.
#[must_use]
pub fn request_span(request_id: &RequestId, method: &str, route: &str) -> Span {
    tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        route = %route,
    )
}

/// Retrieve the identifier of the request being served by the current task, if any.
#[must_use]
pub fn current_request_id() -> Option<RequestId> {
    ACTIVE_REQUEST_CONTEXT
        .try_with(|ctx| ctx.request_id.clone())
        .ok()
}

/// Execute the provided future with the supplied request context available to downstream code.
pub async fn with_request_context<Fut, T>(request_id: RequestId, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    ACTIVE_REQUEST_CONTEXT
        .scope(ActiveRequest { request_id }, fut)
        .await
}

struct ActiveRequest {
    request_id: RequestId,
}

tokio::task_local! {
    static ACTIVE_REQUEST_CONTEXT: ActiveRequest;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_context_guard_enters_app_span() {
        let guard = GlobalContextGuard::new();
        drop(guard);
    }

    #[test]
    fn request_span_accepts_identifiers() {
        let span = request_span(&RequestId::new("req-1"), "GET", "/v1/demo");
        let _entered = span.enter();
    }

    #[tokio::test]
    async fn with_request_context_exposes_identifiers() {
        let output = with_request_context(RequestId::new("req-42"), async {
            assert_eq!(
                current_request_id().as_ref().map(RequestId::as_str),
                Some("req-42")
            );
            "done"
        })
        .await;
        assert_eq!(output, "done");
        assert!(current_request_id().is_none());
    }
}
