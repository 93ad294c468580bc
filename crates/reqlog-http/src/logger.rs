//! The logger handle shared by the request, error and pixel paths.
//!
//! # Design
//! - One cheap-to-clone handle owns the options, the sink and the identifier generator.
//! - Records always go through the fixed serializers in [`crate::serializers`]; callers cannot
//!   swap them out.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::rejection::PathRejection;
use axum::http::StatusCode;
use axum::routing::{MethodRouter, get};
use reqlog_telemetry::{
    IdGenerator, JsonLineSink, LogRecord, LogSink, Payload, RequestId, UuidIdGenerator,
};
use serde_json::Value;

use crate::config::LoggerOptions;
use crate::error::RequestError;
use crate::http::context::RequestContext;
use crate::http::correlate::RequestLoggerLayer;
use crate::http::errors::ErrorLoggerLayer;
use crate::http::pixel::pixel_response;
use crate::serializers::{self, RequestView, ResponseView};

/// Handle used to build the logging layers and the pixel route.
#[derive(Clone)]
pub struct RequestLogger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    options: LoggerOptions,
    sink: Arc<dyn LogSink>,
    ids: Arc<dyn IdGenerator>,
}

impl RequestLogger {
    /// Logger writing JSON lines to standard output.
    #[must_use]
    pub fn new(options: LoggerOptions) -> Self {
        let sink = JsonLineSink::stdout(options.name.clone(), options.level);
        Self::with_sink(options, Arc::new(sink))
    }

    /// Logger writing to a caller-supplied sink, with random identifiers.
    #[must_use]
    pub fn with_sink(options: LoggerOptions, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                options,
                sink,
                ids: Arc::new(UuidIdGenerator),
            }),
        }
    }

    /// Replace the identifier generator.
    #[must_use]
    pub fn with_id_generator(self, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                options: self.inner.options.clone(),
                sink: Arc::clone(&self.inner.sink),
                ids,
            }),
        }
    }

    /// Options the logger was built with.
    #[must_use]
    pub fn options(&self) -> &LoggerOptions {
        &self.inner.options
    }

    /// Draw a fresh request identifier.
    #[must_use]
    pub fn next_request_id(&self) -> RequestId {
        self.inner.ids.next_id()
    }

    /// Log an arbitrary payload at info level.
    pub fn info(&self, payload: Payload) {
        self.inner.sink.info(payload);
    }

    /// Log an arbitrary payload at error level.
    pub fn error(&self, payload: Payload) {
        self.inner.sink.error(payload);
    }

    /// Log a full record.
    pub fn log(&self, record: LogRecord) {
        self.inner.sink.log(record);
    }

    /// Write the `req` record.
    pub fn log_request(&self, request: &RequestView) {
        self.info(single("req", serializers::req(Some(request))));
    }

    /// Write the `res` record.
    pub fn log_response(&self, response: &ResponseView) {
        self.info(single("res", serializers::res(Some(response))));
    }

    /// Write the `err` record.
    pub fn log_error(&self, error: &RequestError) {
        self.error(single("err", serializers::err(Some(error))));
    }

    /// Correlate, redact and log an error seen on its way out.
    ///
    /// The effective status is the error's own status, else the response status. Errors whose
    /// effective status is 4xx lose their trace before being logged.
    pub fn observe_error(
        &self,
        mut error: RequestError,
        context: Option<&RequestContext>,
        response_status: Option<StatusCode>,
    ) -> RequestError {
        let status = error
            .status()
            .or_else(|| response_status.map(|status| status.as_u16()));
        error.set_request_id(context.map(|context| context.request_id().clone()));
        if status.is_some_and(|status| (400..500).contains(&status)) {
            error.redact_stack();
        }
        self.log_error(&error);
        error
    }

    /// Layer logging each request and its response.
    #[must_use]
    pub fn request_layer(&self) -> RequestLoggerLayer {
        RequestLoggerLayer::new(self.clone())
    }

    /// Layer logging handler errors.
    #[must_use]
    pub fn error_layer(&self) -> ErrorLoggerLayer {
        ErrorLoggerLayer::new(self.clone())
    }

    /// `GET` route answering with the tracking pixel.
    ///
    /// Mount it on a path with parameters (e.g. `/log.gif/{msg}`) to have them logged when
    /// [`LoggerOptions::log_params`] is set.
    #[must_use]
    pub fn pixel_route<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let logger = self.clone();
        get(
            move |context: Option<RequestContext>,
                  params: Result<Path<BTreeMap<String, String>>, PathRejection>| async move {
                let params = params.ok().map(|Path(params)| params);
                pixel_response(&logger, context.as_ref(), params)
            },
        )
    }
}

fn single(key: &str, value: Value) -> Payload {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), value);
    payload
}
