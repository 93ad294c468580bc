//! Error types for telemetry operations.

use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Installing the tracing subscriber failed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// Encoding a log record as JSON failed.
    #[error("failed to serialize log record")]
    RecordSerialize {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// Writing a log record to its destination failed.
    #[error("failed to write log record")]
    RecordWrite {
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// A log level name was not recognised.
    #[error("unknown log level")]
    UnknownLevel {
        /// Level name provided by the caller.
        value: String,
    },
}
