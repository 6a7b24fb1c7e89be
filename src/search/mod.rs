//! Search module: lemma-intersection retrieval, relevance and snippets
//!
//! A query is reduced to lemmas. On every searched site, candidate pages are
//! the pages indexed under all of them; relevance is the summed word rank,
//! normalized against the best candidate of the query.

mod service;
mod snippet;

pub use service::SearchService;
pub use snippet::SnippetBuilder;

use serde::Serialize;

/// One page of search results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Number of matching pages before pagination
    pub total_count: usize,
    pub results: Vec<SearchResult>,
}

/// A matching page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub site_url: String,
    pub site_name: String,
    /// Path component of the page URL
    pub page_path: String,
    pub page_title: String,
    /// Text excerpt with query words wrapped in `<b>`
    pub snippet: String,
    /// Relevance in [0, 1], 1 for the best match of the query
    pub relevance: f32,
}
