//! HTML parser for extracting links
//!
//! Only `<a href="...">` targets are collected. Hrefs are returned as written
//! in the page, trimmed; resolving and scoping them is the link filter's job.

use scraper::{Html, Selector};

/// Extracts the raw `href` of every anchor in `html`
///
/// Malformed markup never fails: the parser recovers the same way a browser
/// does. Empty hrefs are dropped and duplicates are kept in document order.
///
/// # Example
///
/// ```
/// use crawlbox::crawler::extract_links;
///
/// let html = r#"<a href="/page">Page</a><a href=" https://other.org/ ">Other</a>"#;
/// assert_eq!(extract_links(html), vec!["/page", "https://other.org/"]);
/// ```
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(String::from)
        .collect()
}
