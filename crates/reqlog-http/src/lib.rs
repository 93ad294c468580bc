#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Request logging middleware for axum/tower stacks.
//!
//! Every request gets an identifier; the request, its response, and any error it produced are
//! logged as separate structured records that share that identifier. A tracking-pixel route is
//! included for hits that originate outside the application (emails, third-party pages).
//!
//! Layout: `logger.rs` (the logger handle), `serializers.rs` (record shapes), `unwind.rs`
//! (cause-chain traces), `error.rs` (error type flowing through the error path), `config.rs`
//! (options), `http/` (layers, completion tracking, pixel route).

pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod serializers;
pub mod unwind;

pub use config::{ConfigError, ConfigResult, DEFAULT_APP_NAME, LoggerOptions};
pub use error::RequestError;
pub use http::context::RequestContext;
pub use http::correlate::{RequestLoggerLayer, RequestLoggerService};
pub use http::errors::{ErrorLoggerLayer, ErrorLoggerService};
pub use http::pixel::{NoCacheLayer, no_cache_layer, pixel_gif};
pub use logger::RequestLogger;
pub use reqlog_telemetry::{IdGenerator, LogLevel, LogSink, Payload, RequestId};
pub use serializers::{RequestView, ResponseView};
pub use unwind::{CAUSE_SEPARATOR, MAX_CAUSE_DEPTH, full_stack};
