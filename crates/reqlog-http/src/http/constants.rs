//! Shared HTTP constants (headers, fixed payloads).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const HEADER_FORWARDED_FOR: &str = "x-forwarded-for";

/// 1x1 transparent GIF served by the tracking pixel.
pub const PIXEL_GIF_BASE64: &str = "R0lGODlhAQABAIAAAP///wAAACwAAAAAAQABAAACAkQBADs=";
/// Media type of [`PIXEL_GIF_BASE64`].
pub const PIXEL_CONTENT_TYPE: &str = "image/gif";

pub(crate) const NO_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";
pub(crate) const NO_CACHE_PRAGMA: &str = "no-cache";
