use crate::UrlError;
use std::collections::HashSet;
use url::Url;

/// Normalizes a URL into the canonical form used as a frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject non-HTTP(S) schemes and URLs without a host
/// 3. Lowercase the host (done by the parser)
/// 4. Normalize path:
///    - Drop empty segments and `.`/`..` markers
///    - Drop segments carrying `#`, `?` or `&`
///    - Keep only the first occurrence of a repeated segment
///    - Remove trailing slash (root stays `/`)
/// 5. Remove fragment and query string
///
/// Step 4 means two different pages whose paths only differ by a repeated
/// segment (`/news/2023/news` and `/news/2023`) collapse into one key.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use lemma_search::url::normalize_url;
///
/// let url = normalize_url("https://Lenta.RU/news/?page=2#top").unwrap();
/// assert_eq!(url.as_str(), "https://lenta.ru/news");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);
    url.set_fragment(None);
    url.set_query(None);

    Ok(url)
}

/// Normalizes a URL path by dropping noise segments and repeated segments
fn normalize_path(path: &str) -> String {
    let mut seen = HashSet::new();
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            s if s.contains(['#', '?', '&']) => continue,
            s => {
                if seen.insert(s) {
                    segments.push(s);
                }
            }
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}
