//! Accept-Encoding negotiation.
//!
//! Only gzip is supported. Matching is exact and case-sensitive: the header
//! value is split on `", "` and one entry must equal `gzip`. Quality values
//! and wildcards are not interpreted.

use crate::http::request::Headers;

/// Encoding applied to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    #[default]
    Identity,
    Gzip,
}

impl ContentEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Identity => "identity",
            ContentEncoding::Gzip => "gzip",
        }
    }

    /// Parse from an Accept-Encoding header value.
    ///
    /// ```
    /// # use courier::http::negotiation::ContentEncoding;
    /// assert_eq!(ContentEncoding::from_accept_encoding("deflate, gzip"), ContentEncoding::Gzip);
    /// assert_eq!(ContentEncoding::from_accept_encoding("gzip;q=1.0"), ContentEncoding::Identity);
    /// ```
    pub fn from_accept_encoding(value: &str) -> Self {
        if value.split(", ").any(|entry| entry == "gzip") {
            ContentEncoding::Gzip
        } else {
            ContentEncoding::Identity
        }
    }
}

/// Picks the response encoding for a request's headers.
///
/// A missing Accept-Encoding header disables compression.
pub fn negotiate(headers: &Headers) -> ContentEncoding {
    headers
        .get("Accept-Encoding")
        .map(|value| ContentEncoding::from_accept_encoding(value.trim()))
        .unwrap_or_default()
}
