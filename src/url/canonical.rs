use crate::url::CanonicalUrl;
use crate::UrlError;
use url::Url;

/// Scheme every canonical URL is forced to unless configured otherwise
pub const DEFAULT_SCHEME: &str = "https";

/// Maps raw absolute URLs to their canonical form
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if it is not an absolute URL
/// 2. Reject schemes other than http and https, and URLs without a host
/// 3. Remove the fragment (everything after #)
/// 4. Force the canonical scheme (https by default)
/// 5. Remove trailing slashes from the path, including the root slash
/// 6. Remove an empty query string (trailing ?)
///
/// The host is lowercased and dot segments are resolved by the parser itself.
/// Applying the canonicalizer to its own output returns the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalizer {
    scheme: String,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer that forces the given scheme
    ///
    /// Only "http" and "https" are meaningful; anything else is rejected by
    /// config validation before it gets here.
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_ascii_lowercase(),
        }
    }

    /// The scheme this canonicalizer forces
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Canonicalizes a raw absolute URL string
    ///
    /// # Arguments
    ///
    /// * `raw` - The URL string to canonicalize
    ///
    /// # Returns
    ///
    /// * `Ok(CanonicalUrl)` - Canonical URL
    /// * `Err(UrlError)` - The input is not an absolute http(s) URL
    ///
    /// # Examples
    ///
    /// ```
    /// use subtree_crawler::url::Canonicalizer;
    ///
    /// let canonicalizer = Canonicalizer::default();
    /// let url = canonicalizer.canonicalize("http://Example.org/a/#top").unwrap();
    /// assert_eq!(url.as_str(), "https://example.org/a");
    /// ```
    pub fn canonicalize(&self, raw: &str) -> Result<CanonicalUrl, UrlError> {
        let raw = raw.trim();
        let mut url = Url::parse(raw).map_err(|e| UrlError::Parse {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::UnsupportedScheme {
                raw: raw.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingHost(raw.to_string()));
        }

        url.set_fragment(None);

        if url.scheme() != self.scheme {
            url.set_scheme(&self.scheme)
                .map_err(|_| UrlError::UnsupportedScheme {
                    raw: raw.to_string(),
                    scheme: self.scheme.clone(),
                })?;
        }

        let path = url.path().trim_end_matches('/').to_string();
        url.set_path(&path);

        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut canonical = String::from(url);

        // The serializer always emits "/" for an empty path
        if !canonical.contains('?') && canonical.ends_with('/') {
            canonical.pop();
        }

        Ok(CanonicalUrl(canonical))
    }
}

/// Canonicalizes a raw absolute URL with the default (https) scheme
///
/// # Examples
///
/// ```
/// use subtree_crawler::url::canonicalize;
///
/// let a = canonicalize("http://host.example/a#frag").unwrap();
/// let b = canonicalize("https://host.example/a/").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize(raw: &str) -> Result<CanonicalUrl, UrlError> {
    Canonicalizer::default().canonicalize(raw)
}
