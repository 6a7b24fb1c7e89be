//! HTML parser for extracting links and the page title
//!
//! Only `<a href>` anchors are followed. Each anchor is classified against
//! the site being crawled, and the survivors are normalized and deduplicated.

use crate::url::{classify_link, normalize_url, SiteScope};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Text of the `<title>` element, empty if absent
    pub title: String,

    /// Normalized same-site links, in document order
    pub links: Vec<String>,
}

/// Parses HTML content and extracts the title and followable links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` resolving into the same site (subdomains included)
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and data URIs
/// - Fragment-only anchors and the bare root `/`
/// - Document files (`.pdf`, `.djvu`, `.doc`, ...)
/// - Links to other sites
///
/// # Example
///
/// ```
/// use lemma_search::crawler::parse_html;
/// use lemma_search::url::SiteScope;
/// use url::Url;
///
/// let base = Url::parse("https://lenta.ru/").unwrap();
/// let scope = SiteScope::new(&base).unwrap();
/// let html = r#"<html><head><title>Лента</title></head><body><a href="/news">Новости</a></body></html>"#;
/// let parsed = parse_html(html, &base, &scope);
/// assert_eq!(parsed.title, "Лента");
/// assert_eq!(parsed.links, vec!["https://lenta.ru/news".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url, scope: &SiteScope) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: title_of(&document),
        links: extract_links(&document, base_url, scope),
    }
}

/// Extracts the `<title>` text of an HTML string
pub fn extract_title(html: &str) -> String {
    title_of(&Html::parse_document(html))
}

fn title_of(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_links(document: &Html, base_url: &Url, scope: &SiteScope) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = classify_link(href, base_url, scope).into_followable() else {
            continue;
        };
        // Normalization can collapse the path back to something already seen
        if let Ok(normalized) = normalize_url(url.as_str()) {
            let normalized = normalized.to_string();
            if seen.insert(normalized.clone()) {
                links.push(normalized);
            }
        }
    }

    links
}
