use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Encodes a URL into a stable, filesystem-safe identifier
///
/// URL-safe base64 without padding: the output never contains `.` or `/`,
/// so it can be used as a file stem and as a database name. The encoding
/// is injective, so distinct URLs never share an identifier.
///
/// # Examples
///
/// ```
/// use crawlbox::url::encode_url;
///
/// assert_eq!(encode_url("http://a.b"), "aHR0cDovL2EuYg");
/// ```
pub fn encode_url(url: &str) -> String {
    URL_SAFE_NO_PAD.encode(url.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_encoding() {
        assert_eq!(
            encode_url("http://example.com"),
            encode_url("http://example.com")
        );
    }

    #[test]
    fn test_distinct_urls_distinct_ids() {
        assert_ne!(
            encode_url("http://example.com/a"),
            encode_url("http://example.com/b")
        );
    }

    #[test]
    fn test_filesystem_safe() {
        let encoded = encode_url("https://example.com/a/b?c=d&e=f#g~~~???");
        assert!(!encoded.is_empty());
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
