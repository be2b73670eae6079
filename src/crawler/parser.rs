//! HTML link extraction
//!
//! Parses fetched markup and turns every anchor into a canonical absolute URL.
//! Boundary filtering is left to the caller: this module answers "what does
//! the page link to", not "what may be crawled".

use crate::url::{CanonicalUrl, Canonicalizer};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the canonical targets of all `<a href>` elements
///
/// Each href is resolved against `base_url` using standard URL resolution,
/// then canonicalized. Hrefs that cannot be resolved or canonicalized
/// (`javascript:`, `mailto:`, malformed values) are skipped. The result keeps
/// document order and holds each URL once.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was served from
/// * `canonicalizer` - Canonicalizer of the running crawl
///
/// # Example
///
/// ```
/// use subtree_crawler::crawler::extract_links;
/// use subtree_crawler::url::Canonicalizer;
/// use url::Url;
///
/// let html = r#"<a href="N-1.html">1</a><a href="N-1.html#top">again</a>"#;
/// let base = Url::parse("https://example.org/~owner/set/N-0.html").unwrap();
/// let links = extract_links(html, &base, &Canonicalizer::default());
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.org/~owner/set/N-1.html");
/// ```
pub fn extract_links(html: &str, base_url: &Url, canonicalizer: &Canonicalizer) -> Vec<CanonicalUrl> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match resolve_link(href, base_url, canonicalizer) {
            Some(url) => {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            None => tracing::trace!("Skipping href {:?} on {}", href, base_url),
        }
    }

    links
}

/// Resolves one href against the base URL and canonicalizes it
fn resolve_link(href: &str, base_url: &Url, canonicalizer: &Canonicalizer) -> Option<CanonicalUrl> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    canonicalizer.canonicalize(absolute.as_str()).ok()
}
