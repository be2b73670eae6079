//! URL handling module
//!
//! This module provides URL canonicalization (the identity key for pages) and
//! the boundary policy that keeps a crawl inside its owner subtree.

mod boundary;
mod canonical;

use std::fmt;

// Re-export main functions
pub use boundary::{in_boundary, site_root, Boundary};
pub use canonical::{canonicalize, Canonicalizer, DEFAULT_SCHEME};

/// A URL in canonical form
///
/// Fragment stripped, scheme forced to the canonical scheme, no trailing
/// slash. Only produced by a [`Canonicalizer`] or read back from storage, and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    /// Wraps a string that was canonicalized before it was persisted
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the canonical string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Parses the canonical form back into a [`::url::Url`] for fetching or
    /// link resolution
    pub fn to_url(&self) -> crate::UrlResult<::url::Url> {
        ::url::Url::parse(&self.0).map_err(|e| crate::UrlError::Parse {
            raw: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CanonicalUrl {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CanonicalUrl {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_as_str() {
        let url = canonicalize("https://example.org/a/").unwrap();
        assert_eq!(url.to_string(), url.as_str());
        assert_eq!(url, "https://example.org/a");
    }

    #[test]
    fn test_to_url_roundtrip() {
        let url = canonicalize("https://example.org/~owner/set/N-0.html").unwrap();
        let parsed = url.to_url().unwrap();
        assert_eq!(parsed.host_str(), Some("example.org"));
        assert_eq!(parsed.path(), "/~owner/set/N-0.html");
    }

    #[test]
    fn test_to_url_for_root() {
        let url = canonicalize("https://example.org/").unwrap();
        assert_eq!(url, "https://example.org");
        assert_eq!(url.to_url().unwrap().path(), "/");
    }
}
