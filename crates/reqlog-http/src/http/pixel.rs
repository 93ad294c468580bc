//! Tracking pixel route.
//!
//! The pixel is a 1x1 transparent GIF. Hits are meant to reach the server every time, so the
//! route is normally composed behind [`no_cache_layer`].

use std::collections::BTreeMap;

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::{Engine as _, engine::general_purpose};
use reqlog_telemetry::{LogLevel, LogRecord, Payload};
use serde_json::Value;
use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::http::constants::{
    NO_CACHE_CONTROL, NO_CACHE_PRAGMA, PIXEL_CONTENT_TYPE, PIXEL_GIF_BASE64,
};
use crate::http::context::RequestContext;
use crate::logger::RequestLogger;

const REQUEST_ID_KEY: &str = "requestId";
const MESSAGE_PARAM: &str = "msg";

/// Layer stack produced by [`no_cache_layer`].
pub type NoCacheLayer = Stack<
    SetResponseHeaderLayer<HeaderValue>,
    Stack<SetResponseHeaderLayer<HeaderValue>, Identity>,
>;

/// Decode the embedded pixel.
///
/// # Errors
///
/// Returns the decoder error if the embedded constant is not valid base64.
pub fn pixel_gif() -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(PIXEL_GIF_BASE64)
}

/// Layer forcing clients and proxies to re-fetch every response.
#[must_use]
pub fn no_cache_layer() -> NoCacheLayer {
    ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE_CONTROL),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            PRAGMA,
            HeaderValue::from_static(NO_CACHE_PRAGMA),
        ))
        .into_inner()
}

pub(crate) fn pixel_response(
    logger: &RequestLogger,
    context: Option<&RequestContext>,
    params: Option<BTreeMap<String, String>>,
) -> Response {
    if logger.options().log_params
        && let Some(params) = params.filter(|params| !params.is_empty())
    {
        logger.log(params_record(params, context));
    }

    match pixel_gif() {
        Ok(bytes) => ([(CONTENT_TYPE, PIXEL_CONTENT_TYPE)], bytes).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode tracking pixel");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn params_record(params: BTreeMap<String, String>, context: Option<&RequestContext>) -> LogRecord {
    let msg = params.get(MESSAGE_PARAM).cloned().unwrap_or_default();
    let mut payload: Payload = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    payload.insert(
        REQUEST_ID_KEY.to_string(),
        context.map_or(Value::Null, |context| {
            Value::from(context.request_id().as_str())
        }),
    );
    LogRecord::new(LogLevel::Info, payload).with_msg(msg)
}
