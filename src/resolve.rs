use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::IngestError;

/// Share-URN form, e.g. `urn:li:share:7123456789`. Tried first so an
/// incidental numeric path segment elsewhere in the URL cannot shadow it.
static URN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"urn:li:(?:share|ugcshare):(\d+)").expect("urn pattern"));

/// Generic fallback: numeric path segments, validated against the following
/// character so partial matches like `/123abc` are rejected.
static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)").expect("numeric segment pattern"));

/// Derive the canonical post id from a post URL.
///
/// Patterns are tried in order, first hit wins: the share-URN capture, then
/// the last purely numeric path segment.
pub fn resolve(url: &str) -> Result<String, IngestError> {
    if let Some(caps) = URN_ID.captures(url) {
        return Ok(caps[1].to_string());
    }
    if let Some(id) = last_numeric_segment(url) {
        return Ok(id);
    }
    Err(IngestError::IdentifierNotFound {
        url: url.to_string(),
    })
}

fn last_numeric_segment(url: &str) -> Option<String> {
    let mut last = None;
    for caps in NUMERIC_SEGMENT.captures_iter(url) {
        let m = caps.get(1)?;
        let rest = &url[m.end()..];
        if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
            last = Some(m.as_str().to_string());
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_share_urn() {
        let id = resolve("https://www.linkedin.com/feed/update/urn:li:share:7261234567890123456")
            .unwrap();
        assert_eq!(id, "7261234567890123456");
    }

    #[test]
    fn resolves_ugcshare_urn() {
        let id = resolve("https://example.com/?u=urn:li:ugcshare:42").unwrap();
        assert_eq!(id, "42");
    }

    #[test]
    fn urn_beats_numeric_path_segment() {
        let id = resolve("https://example.com/posts/999/urn:li:share:12345").unwrap();
        assert_eq!(id, "12345");
    }

    #[test]
    fn falls_back_to_last_numeric_segment() {
        let id = resolve("https://example.com/feed/123/comments/456/").unwrap();
        assert_eq!(id, "456");
    }

    #[test]
    fn numeric_segment_with_query_string() {
        let id = resolve("https://example.com/posts/789?utm_source=x").unwrap();
        assert_eq!(id, "789");
    }

    #[test]
    fn mixed_segments_are_not_ids() {
        let err = resolve("https://example.com/posts/123abc").unwrap_err();
        assert!(matches!(err, IngestError::IdentifierNotFound { .. }));
        assert!(err.to_string().contains("123abc"));
    }

    #[test]
    fn host_digits_do_not_match() {
        assert!(resolve("http://127.0.0.1:8080/about").is_err());
    }
}
