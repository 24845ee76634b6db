//! Scope and keyword filtering for discovered links

use crate::config::CrawlConfig;
use crate::url::normalize_url;
use url::Url;

/// Decides which discovered links may enter the frontier
///
/// Rejections are expected and frequent, so they are reported as `None`
/// with a trace-level note rather than as errors.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    base_url: String,
    exclude_keywords: Vec<String>,
    include_keywords: Vec<String>,
}

impl LinkFilter {
    pub fn new(
        base_url: impl Into<String>,
        exclude_keywords: Vec<String>,
        include_keywords: Vec<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim().to_string(),
            exclude_keywords,
            include_keywords,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.exclude_keywords.clone(),
            config.include_keywords.clone(),
        )
    }

    /// Turns a raw `href` into an accepted canonical URL, or rejects it
    ///
    /// # Filtering Steps
    ///
    /// 1. Drop everything from the first `?`
    /// 2. Prefix links without a scheme with the base URL
    /// 3. Require the base URL as a substring (scope check)
    /// 4. Canonicalize; reject on failure
    /// 5. Reject if any exclude keyword occurs in the canonical form
    /// 6. If include keywords are configured, require at least one
    ///
    /// # Examples
    ///
    /// ```
    /// use crawlbox::url::LinkFilter;
    ///
    /// let filter = LinkFilter::new("http://example.com", vec![], vec![]);
    /// assert_eq!(filter.filter("/about?x=1").as_deref(), Some("http://example.com/about"));
    /// assert_eq!(filter.filter("http://other.com/page"), None);
    /// ```
    pub fn filter(&self, raw: &str) -> Option<String> {
        let link = strip_query(raw.trim());
        if link.is_empty() {
            tracing::trace!("Skipping empty link {:?}", raw);
            return None;
        }

        let absolute = match classify(link) {
            LinkKind::Absolute => link.to_string(),
            LinkKind::Relative => join_to_base(&self.base_url, link),
            LinkKind::Foreign => {
                tracing::trace!("Skipping {} because it is not a web link", link);
                return None;
            }
        };

        if !absolute.contains(&self.base_url) {
            tracing::trace!("Skipping {} because it has a different base URL", absolute);
            return None;
        }

        let canonical = match normalize_url(&absolute) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::trace!("Skipping {}: {}", absolute, e);
                return None;
            }
        };
        if canonical.is_empty() {
            return None;
        }

        if let Some(keyword) = self
            .exclude_keywords
            .iter()
            .find(|keyword| canonical.contains(keyword.as_str()))
        {
            tracing::trace!("Skipping {} because it contains {}", canonical, keyword);
            return None;
        }

        if !self.include_keywords.is_empty()
            && !self
                .include_keywords
                .iter()
                .any(|keyword| canonical.contains(keyword.as_str()))
        {
            tracing::trace!("Skipping {} because it has no include keyword", canonical);
            return None;
        }

        Some(canonical)
    }
}

fn strip_query(link: &str) -> &str {
    match link.find('?') {
        Some(index) => &link[..index],
        None => link,
    }
}

/// Schemes whose links never lead to a crawlable page
const FOREIGN_SCHEMES: &[&str] = &["mailto", "javascript", "tel", "sms", "data", "about", "blob"];

#[derive(Debug, PartialEq, Eq)]
enum LinkKind {
    /// Starts with `http:` or `https:`
    Absolute,
    /// Joined to the base URL, including `Name:page` style paths
    Relative,
    /// Another protocol (`ftp://`, `mailto:`, ...)
    Foreign,
}

fn classify(link: &str) -> LinkKind {
    let Ok(url) = Url::parse(link) else {
        return LinkKind::Relative;
    };

    match url.scheme() {
        "http" | "https" => LinkKind::Absolute,
        scheme
            if FOREIGN_SCHEMES.contains(&scheme)
                || link
                    .get(scheme.len()..)
                    .is_some_and(|rest| rest.starts_with("://")) =>
        {
            LinkKind::Foreign
        }
        _ => LinkKind::Relative,
    }
}

fn join_to_base(base: &str, link: &str) -> String {
    if base.ends_with('/') || link.starts_with('/') {
        format!("{}{}", base, link)
    } else {
        format!("{}/{}", base, link)
    }
}
