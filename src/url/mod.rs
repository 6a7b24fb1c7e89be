//! URL handling module for Lemma-Search
//!
//! This module provides URL normalization, registered-domain extraction and
//! the link classification used to keep a crawl on its own site.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{is_same_site, site_domain};
pub use normalize::normalize_url;

/// File extensions that are never fetched as pages
const EXCLUDED_EXTENSIONS: &[&str] = &[".pdf", ".fb", ".mobi", ".djvu", ".doc", ".txt"];

/// The site a crawl is confined to
#[derive(Debug, Clone)]
pub struct SiteScope {
    root: Url,
    domain: String,
}

impl SiteScope {
    /// Builds a scope from a site root URL
    ///
    /// Returns None if the URL has no host.
    pub fn new(root: &Url) -> Option<Self> {
        let domain = site_domain(root)?;
        Some(Self {
            root: root.clone(),
            domain,
        })
    }

    /// The site root URL
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// The registered domain the crawl is confined to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the URL belongs to this site
    pub fn contains(&self, url: &Url) -> bool {
        is_same_site(url, &self.domain, &self.root)
    }
}

/// How an anchor `href` relates to the site being crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkClassification {
    /// Absolute link into the same site
    SameSite(Url),
    /// Relative link, resolved against the page it was found on
    Relative(Url),
    /// Link to another site
    External,
    /// Link to a document file (pdf, djvu, ...)
    File,
    /// Not a navigable link (fragment, `mailto:`, `javascript:`, root, malformed)
    Ignored,
}

impl LinkClassification {
    /// Returns the URL if the link should be fed back into the frontier
    pub fn into_followable(self) -> Option<Url> {
        match self {
            Self::SameSite(url) | Self::Relative(url) => Some(url),
            _ => None,
        }
    }
}

/// Classifies an anchor `href` found on `base`
///
/// # Arguments
///
/// * `href` - Raw attribute value
/// * `base` - URL of the page the link was found on
/// * `scope` - The site being crawled
///
/// # Examples
///
/// ```
/// use lemma_search::url::{classify_link, LinkClassification, SiteScope};
/// use url::Url;
///
/// let root = Url::parse("https://lenta.ru/").unwrap();
/// let scope = SiteScope::new(&root).unwrap();
/// let link = classify_link("/news/1", &root, &scope);
/// assert!(matches!(link, LinkClassification::Relative(_)));
/// ```
pub fn classify_link(href: &str, base: &Url, scope: &SiteScope) -> LinkClassification {
    let href = href.trim();

    if href.is_empty() || href == "/" || href.starts_with('#') {
        return LinkClassification::Ignored;
    }

    let lowered = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return LinkClassification::Ignored;
    }

    let (url, absolute) = match Url::parse(href) {
        Ok(url) => (url, true),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base.join(href) {
            Ok(url) => (url, false),
            Err(_) => return LinkClassification::Ignored,
        },
        Err(_) => return LinkClassification::Ignored,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return LinkClassification::Ignored;
    }

    if is_file_link(&url) {
        return LinkClassification::File;
    }

    if !scope.contains(&url) {
        return LinkClassification::External;
    }

    if absolute {
        LinkClassification::SameSite(url)
    } else {
        LinkClassification::Relative(url)
    }
}

/// Returns true if the URL path ends with one of the excluded document extensions
pub fn is_file_link(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    EXCLUDED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
