//! HTTP surface modules (layers, completion tracking, pixel route).

/// Response body adapter that reports completion once.
pub(crate) mod body;
/// Shared header names and fixed payloads.
pub mod constants;
/// Request-scoped correlation context.
pub mod context;
/// Request/response correlation layer.
pub mod correlate;
/// Error correlation layer.
pub mod errors;
/// Tracking pixel route and cache-disabling layer.
pub mod pixel;
