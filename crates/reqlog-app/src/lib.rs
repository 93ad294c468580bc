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

//! Demo server wiring for the request logger.
//!
//! Layout: `bootstrap.rs` (settings and server startup), `routes.rs` (demo router).

/// Settings loading and server startup.
pub mod bootstrap;
/// Application error type.
pub mod error;
/// Demo routes wrapped in the logging layers.
pub mod routes;

pub use bootstrap::{AppSettings, run_app};
pub use error::{AppError, AppResult};
pub use routes::router;
