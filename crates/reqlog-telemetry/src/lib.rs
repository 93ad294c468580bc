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

//! Telemetry primitives for request logging.
//!
//! This crate owns the structured record sinks, the envelope every record is
//! wrapped in, request identifiers, and the diagnostic `tracing` setup used by
//! the binaries.
//!
//! Layout: `init.rs` (subscriber setup), `sink.rs` (record sinks and levels),
//! `id.rs` (request identifiers), `context.rs` (task-local request context),
//! `error.rs` (telemetry errors).

pub mod context;
pub mod error;
pub mod id;
pub mod init;
pub mod sink;

pub use context::{GlobalContextGuard, current_request_id, request_span, with_request_context};
pub use error::{Result, TelemetryError};
pub use id::{IdGenerator, RequestId, UuidIdGenerator};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, app_name, init_logging};
pub use sink::{
    Envelope, JsonLineSink, LOG_SCHEMA_VERSION, LogLevel, LogRecord, LogSink, Payload, TracingSink,
};
