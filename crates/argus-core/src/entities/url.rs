//! URL extraction and classification.

use regex::Regex;
use url::Url;

use super::{DetectionMethod, UrlCategory, UrlEntity};
use crate::catalog::Catalog;

/// Confidence attached to every extracted URL.
pub const URL_CONFIDENCE: f32 = 0.9;

/// Explicit scheme, `www.` prefix, then bare domain-like tokens.
const URL_PATTERNS: [&str; 3] = [
    r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#,
    r#"(?i)www\.[^\s<>"{}|\\^`\[\]]+"#,
    r#"(?i)[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:/[^\s<>"{}|\\^`\[\]]*)?"#,
];

/// Finds URLs in free text using a fixed, ordered set of patterns.
///
/// Each pattern is applied independently, so the same URL can be reported
/// once per pattern that matches it.
pub struct UrlExtractor {
    patterns: Vec<Regex>,
}

impl UrlExtractor {
    pub fn new() -> Self {
        Self {
            patterns: URL_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("Invalid URL pattern"))
                .collect(),
        }
    }

    /// Returns every valid match in pattern order, then text order.
    pub fn extract(&self, text: &str, catalog: &Catalog) -> Vec<UrlEntity> {
        self.patterns
            .iter()
            .flat_map(|re| re.find_iter(text))
            .map(|m| m.as_str())
            .filter(|candidate| is_valid_url(candidate))
            .map(|candidate| UrlEntity {
                url: candidate.to_string(),
                category: classify_url(candidate, catalog),
                confidence: URL_CONFIDENCE,
                detection_method: DetectionMethod::Text,
            })
            .collect()
    }
}

impl Default for UrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `candidate` parses to a URL with both a scheme and a host once
/// `http://` is prepended to scheme-less input.
pub fn is_valid_url(candidate: &str) -> bool {
    let owned;
    let full = if candidate.starts_with("http://") || candidate.starts_with("https://") {
        candidate
    } else {
        owned = format!("http://{candidate}");
        &owned
    };
    match Url::parse(full) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// First catalog category with a keyword contained in the URL.
pub fn classify_url(url: &str, catalog: &Catalog) -> UrlCategory {
    let lower = url.to_lowercase();
    catalog
        .url_categories
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())))
        .map(|rule| rule.category)
        .unwrap_or(UrlCategory::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_with_default_scheme() {
        assert!(is_valid_url("example.com/path"));
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("www.rust-lang.org"));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn classifies_by_priority() {
        let catalog = Catalog::default();
        assert_eq!(classify_url("example.com/path", &catalog), UrlCategory::General);
        assert_eq!(
            classify_url("https://www.Facebook.com/news", &catalog),
            UrlCategory::SocialMedia
        );
        assert_eq!(classify_url("github.com/blog", &catalog), UrlCategory::Development);
        assert_eq!(classify_url("www.twitch.tv", &catalog), UrlCategory::Video);
        assert_eq!(classify_url("technews.example.org", &catalog), UrlCategory::News);
    }

    #[test]
    fn patterns_run_independently() {
        let extractor = UrlExtractor::new();
        let urls = extractor.extract("see https://youtube.com/watch now", &Catalog::default());
        // The scheme pattern and the bare-domain pattern both match.
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].url, "https://youtube.com/watch");
        assert_eq!(urls[1].url, "youtube.com/watch");
        assert!(urls.iter().all(|u| u.category == UrlCategory::Video));
        assert!(urls.iter().all(|u| u.confidence == URL_CONFIDENCE));
    }

    #[test]
    fn plain_prose_has_no_urls() {
        let extractor = UrlExtractor::new();
        assert!(extractor
            .extract("quarterly numbers look fine", &Catalog::default())
            .is_empty());
    }
}
