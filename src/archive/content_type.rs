use mime::Mime;

/// Known MIME essences and the extension archived files get for them
const EXTENSIONS: &[(&str, &str)] = &[
    ("text/html", ".html"),
    ("application/xhtml+xml", ".html"),
    ("text/plain", ".txt"),
    ("text/css", ".css"),
    ("text/csv", ".csv"),
    ("text/markdown", ".md"),
    ("text/xml", ".xml"),
    ("application/xml", ".xml"),
    ("application/rss+xml", ".rss"),
    ("application/atom+xml", ".atom"),
    ("application/json", ".json"),
    ("application/ld+json", ".jsonld"),
    ("text/javascript", ".js"),
    ("application/javascript", ".js"),
    ("application/pdf", ".pdf"),
    ("application/zip", ".zip"),
    ("application/gzip", ".gz"),
    ("application/msword", ".doc"),
    ("application/vnd.openxmlformats-officedocument.wordprocessingml.document", ".docx"),
    ("application/vnd.ms-excel", ".xls"),
    ("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", ".xlsx"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
    ("image/svg+xml", ".svg"),
    ("image/x-icon", ".ico"),
    ("image/vnd.microsoft.icon", ".ico"),
    ("audio/mpeg", ".mp3"),
    ("audio/ogg", ".ogg"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("font/woff", ".woff"),
    ("font/woff2", ".woff2"),
];

/// Maps a `Content-Type` header value to an archive file extension
///
/// Parameters such as `charset` are ignored. Returns `None` for malformed or
/// unknown types.
///
/// # Examples
///
/// ```
/// use crawlbox::archive::extension_for_content_type;
///
/// assert_eq!(extension_for_content_type("text/html; charset=utf-8"), Some(".html"));
/// assert_eq!(extension_for_content_type("application/x-unknown"), None);
/// ```
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime: Mime = content_type.trim().parse().ok()?;
    let essence = mime.essence_str();

    EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(essence))
        .map(|(_, extension)| *extension)
}
