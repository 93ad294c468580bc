//! # Design
//!
//! - Centralize application-level errors for startup and serving.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Logger options could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Source configuration error.
        #[from]
        source: reqlog_http::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: reqlog_telemetry::TelemetryError,
    },
    /// The bind address could not be parsed.
    #[error("invalid bind address")]
    InvalidBindAddr {
        /// Offending value.
        value: String,
        /// Parse failure.
        source: AddrParseError,
    },
    /// The listener could not be bound.
    #[error("failed to bind listener")]
    Bind {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// Source IO error.
        source: io::Error,
    },
    /// The server stopped with an error.
    #[error("server terminated with an error")]
    Serve {
        /// Source IO error.
        source: io::Error,
    },
}

impl AppError {
    pub(crate) const fn telemetry(
        operation: &'static str,
        source: reqlog_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}
