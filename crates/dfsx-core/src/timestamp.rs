//! Stable textual rendering of file modification times.
//!
//! Byte-equality on this string is the cache-validity test: the
//! exact format doesn't matter, only that the same server renders the same
//! underlying timestamp identically every time. `httpdate` gives us
//! second-resolution RFC 7231 strings, which is what `std::fs::Metadata`'s
//! mtime can resolve to reliably across platforms anyway.

use std::fmt;
use std::time::SystemTime;

/// A `Last-Modified` cache token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct LastModified(String);

impl LastModified {
    /// Renders a [`SystemTime`] as a stable `Last-Modified` token.
    pub fn from_system_time(t: SystemTime) -> Self {
        LastModified(httpdate::fmt_http_date(t))
    }

    /// Wraps an already-formatted token, e.g. one read off the wire.
    pub fn from_raw(s: impl Into<String>) -> Self {
        LastModified(s.into())
    }

    /// Returns the token as a string slice, for use as an HTTP header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LastModified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn same_instant_renders_identically() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let a = LastModified::from_system_time(t);
        let b = LastModified::from_system_time(t);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn different_instants_render_differently() {
        let a = LastModified::from_system_time(SystemTime::UNIX_EPOCH + Duration::from_secs(1));
        let b = LastModified::from_system_time(SystemTime::UNIX_EPOCH + Duration::from_secs(2));
        assert_ne!(a, b);
    }
}
