//! HTTP-date helpers
//!
//! Formats `Last-Modified` values and parses `If-Modified-Since` values
//! (IMF-fixdate, RFC 850 and asctime forms).

use std::time::SystemTime;

/// Format a timestamp as an IMF-fixdate, e.g. `Thu, 10 Oct 2013 23:40:00 GMT`
pub fn format(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Parse an HTTP-date, returning `None` for malformed values
pub fn parse(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value.trim()).ok()
}
