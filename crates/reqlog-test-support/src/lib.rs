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

//! Shared test helpers used across request logging suites.
//! Layout: fixtures.rs (requests and identifiers), recording.rs (in-memory sink).

pub mod fixtures;
pub mod recording;

pub use fixtures::{SequentialIds, TEST_PEER, get_request, request_with_headers};
pub use recording::RecordingSink;
