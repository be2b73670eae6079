use crate::url::CanonicalUrl;
use crate::UrlError;

/// Computes the site root (boundary prefix) for a seed URL
///
/// The root is the seed's origin followed by the owner subtree segment and a
/// trailing slash, e.g. `https://example.org/~owner/`. When `owner_segment` is
/// `None` the first path segment of the seed is used; a seed whose path has at
/// most one segment (a page directly under the origin) yields the bare origin.
///
/// # Arguments
///
/// * `seed` - The canonical seed URL of a dataset
/// * `owner_segment` - Explicit owner subtree segment, with or without slashes
///
/// # Returns
///
/// * `Ok(String)` - The boundary prefix
/// * `Err(UrlError)` - The seed cannot be parsed back into a URL
///
/// # Examples
///
/// ```
/// use subtree_crawler::url::{canonicalize, site_root};
///
/// let seed = canonicalize("https://example.org/~owner/set/N-0.html").unwrap();
/// assert_eq!(site_root(&seed, None).unwrap(), "https://example.org/~owner/");
/// ```
pub fn site_root(seed: &CanonicalUrl, owner_segment: Option<&str>) -> Result<String, UrlError> {
    let url = seed.to_url()?;
    let origin = url.origin().ascii_serialization();

    let segment = match owner_segment {
        Some(segment) => segment.trim_matches('/').to_string(),
        // A seed directly under the origin has no owner directory
        None => match url.path_segments() {
            Some(mut segments) => match (segments.next(), segments.next()) {
                (Some(first), Some(_)) => first.to_string(),
                _ => String::new(),
            },
            None => String::new(),
        },
    };

    if segment.is_empty() {
        Ok(format!("{}/", origin))
    } else {
        Ok(format!("{}/{}/", origin, segment))
    }
}

/// Checks whether a canonical URL lies inside the boundary prefix
///
/// This is a plain prefix test on the canonical string form.
pub fn in_boundary(url: &str, prefix: &str) -> bool {
    url.starts_with(prefix)
}

/// The crawl boundary of one dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    root: String,
}

impl Boundary {
    /// Derives the boundary from a dataset's canonical seed
    pub fn from_seed(seed: &CanonicalUrl, owner_segment: Option<&str>) -> Result<Self, UrlError> {
        Ok(Self {
            root: site_root(seed, owner_segment)?,
        })
    }

    /// The boundary prefix
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns true if the URL may be crawled and linked to
    pub fn contains(&self, url: &CanonicalUrl) -> bool {
        in_boundary(url.as_str(), &self.root)
    }
}
