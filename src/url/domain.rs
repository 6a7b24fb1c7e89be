use url::{Host, Url};

/// Derives the registered domain a crawl is scoped to
///
/// The first label is stripped from hosts with more than one dot, so
/// `www.lenta.ru` and `lenta.ru` share the domain `lenta.ru`. IP addresses
/// are returned unchanged.
///
/// # Arguments
///
/// * `url` - The site root URL
///
/// # Returns
///
/// * `Some(String)` - The lowercase registered domain
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use lemma_search::url::site_domain;
///
/// let url = Url::parse("https://www.lenta.ru/").unwrap();
/// assert_eq!(site_domain(&url), Some("lenta.ru".to_string()));
/// ```
pub fn site_domain(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(host) => {
            let host = host.to_lowercase();
            if host.matches('.').count() > 1 {
                host.split_once('.').map(|(_, rest)| rest.to_string())
            } else {
                Some(host)
            }
        }
        ip => Some(ip.to_string()),
    }
}

/// Checks whether a URL belongs to the crawl scoped to `domain`
///
/// The host must equal the domain or be one of its subdomains, and the
/// port must match the site root's port.
pub fn is_same_site(url: &Url, domain: &str, site_root: &Url) -> bool {
    if url.port_or_known_default() != site_root.port_or_known_default() {
        return false;
    }

    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            host == domain || host.ends_with(&format!(".{}", domain))
        }
        None => false,
    }
}
