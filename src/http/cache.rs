//! HTTP cache validation module
//!
//! `ETag` derivation from file metadata and conditional request evaluation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Derive a strong `ETag` from modification time and size
///
/// The tag never depends on file content, so it can be computed from a
/// `stat` alone. Format: `"<mtime nanoseconds, hex>-<size, hex>"`.
///
/// # Examples
/// ```
/// use std::time::{Duration, UNIX_EPOCH};
/// use staticfiles::http::cache::generate_etag;
///
/// let mtime = UNIX_EPOCH + Duration::from_secs(1);
/// assert_eq!(generate_etag(mtime, 14), "\"3b9aca00-e\"");
/// ```
pub fn generate_etag(modified: SystemTime, size: u64) -> String {
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!("\"{nanos:x}-{size:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Weak validators: `W/"abc123"` (weak comparison)
/// - Wildcard: `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|tag| {
            let tag = tag.trim();
            tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
        })
    })
}

/// Check `If-Modified-Since` against the resource's modification time
///
/// HTTP dates carry whole seconds only, so `modified` is truncated before
/// comparing. Unparseable dates never match.
pub fn check_not_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(super::date::parse) else {
        return false;
    };
    since >= truncate_to_seconds(modified)
}

/// Decide whether a conditional request can be answered with 304
///
/// A matching `If-None-Match` wins; otherwise `If-Modified-Since` decides.
pub fn is_not_modified(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    etag: &str,
    modified: SystemTime,
) -> bool {
    check_etag_match(if_none_match, etag) || check_not_modified_since(if_modified_since, modified)
}

fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    time.duration_since(UNIX_EPOCH)
        .map_or(time, |d| UNIX_EPOCH + Duration::from_secs(d.as_secs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64, nanos: u32) -> SystemTime {
        UNIX_EPOCH + Duration::new(secs, nanos)
    }

    #[test]
    fn test_generate_etag() {
        let etag = generate_etag(at(1_381_448_400, 0), 14);
        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        assert!(etag.ends_with("-e\""));
    }

    #[test]
    fn test_etag_consistency() {
        assert_eq!(generate_etag(at(10, 5), 100), generate_etag(at(10, 5), 100));
    }

    #[test]
    fn test_etag_changes_with_mtime_or_size() {
        let base = generate_etag(at(10, 5), 100);
        assert_ne!(base, generate_etag(at(10, 6), 100));
        assert_ne!(base, generate_etag(at(10, 5), 101));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_modified_since_second_precision() {
        let modified = at(1_381_448_400, 750_000_000);
        // Thu, 10 Oct 2013 23:40:00 GMT
        let same_second = "Thu, 10 Oct 2013 23:40:00 GMT";
        assert!(check_not_modified_since(Some(same_second), modified));

        let earlier = "Thu, 10 Oct 2013 23:39:59 GMT";
        assert!(!check_not_modified_since(Some(earlier), modified));
    }

    #[test]
    fn test_modified_since_invalid_date() {
        assert!(!check_not_modified_since(Some("yesterday"), at(0, 0)));
        assert!(!check_not_modified_since(None, at(0, 0)));
    }

    #[test]
    fn test_is_not_modified_falls_back_to_date() {
        let modified = at(1_381_448_400, 0);
        let etag = generate_etag(modified, 3);
        assert!(is_not_modified(
            Some("\"stale\""),
            Some("Fri, 11 Oct 2013 15:30:19 GMT"),
            &etag,
            modified
        ));
        assert!(!is_not_modified(
            Some("\"stale\""),
            Some("Mon, 20 Feb 2012 15:30:19 GMT"),
            &etag,
            modified
        ));
    }
}
