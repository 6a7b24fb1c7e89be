//! Lemma-intersection search over indexed sites

use crate::config::{Config, SiteEntry};
use crate::crawler::extract_title;
use crate::lemma::{html_to_text, Lemmatizer};
use crate::search::{SearchResponse, SearchResult, SnippetBuilder};
use crate::storage::{LemmaRecord, SharedStorage, SiteRecord, Storage};
use crate::EngineError;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;

/// A page matching every query lemma on its site
#[derive(Debug, Clone)]
struct Candidate {
    site: SiteRecord,
    page_id: i64,
    /// Query lemmas of the page's site, rarest first
    lemmas: Arc<Vec<LemmaRecord>>,
    absolute_relevance: i64,
}

/// The last query and everything it matched
#[derive(Debug)]
struct Memo {
    query: String,
    site: Option<String>,
    results: Arc<Vec<SearchResult>>,
}

/// Answers free-text queries against the index
pub struct SearchService {
    config: Arc<Config>,
    storage: SharedStorage,
    lemmatizer: Lemmatizer,
    snippets: SnippetBuilder,
    memo: Mutex<Option<Memo>>,
}

impl SearchService {
    pub fn new(config: Arc<Config>, storage: SharedStorage, lemmatizer: Lemmatizer) -> Self {
        let snippets = SnippetBuilder::new(config.search.snippet_interval);
        Self {
            config,
            storage,
            lemmatizer,
            snippets,
            memo: Mutex::new(None),
        }
    }

    /// Searches all configured sites, or only `site`
    ///
    /// Results are ordered by relevance, highest first, and paginated with
    /// `offset` and `limit`. Repeating the previous (query, site) pair reuses
    /// its result list.
    ///
    /// # Errors
    ///
    /// * `EngineError::OutOfScope` - `site` is not a configured site
    /// * Storage failures
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResponse, EngineError> {
        let sites = self.target_sites(site)?;
        let results = self.memoized(query, site, &sites)?;

        Ok(SearchResponse {
            total_count: results.len(),
            results: results.iter().skip(offset).take(limit).cloned().collect(),
        })
    }

    /// Forgets the last query
    pub fn invalidate(&self) {
        *self.memo.lock() = None;
    }

    fn memoized(
        &self,
        query: &str,
        site: Option<&str>,
        sites: &[&SiteEntry],
    ) -> Result<Arc<Vec<SearchResult>>, EngineError> {
        if let Some(memo) = self.memo.lock().as_ref() {
            if memo.query == query && memo.site.as_deref() == site {
                tracing::debug!("Reusing results of '{}'", query);
                return Ok(Arc::clone(&memo.results));
            }
        }

        let results = Arc::new(self.run_query(query, sites)?);
        *self.memo.lock() = Some(Memo {
            query: query.to_string(),
            site: site.map(str::to_string),
            results: Arc::clone(&results),
        });
        Ok(results)
    }

    fn target_sites(&self, filter: Option<&str>) -> Result<Vec<&SiteEntry>, EngineError> {
        let Some(filter) = filter else {
            return Ok(self.config.sites.iter().collect());
        };

        let wanted = filter.trim().trim_end_matches('/');
        self.config
            .sites
            .iter()
            .find(|entry| entry.url.trim_end_matches('/') == wanted)
            .map(|entry| vec![entry])
            .ok_or_else(|| EngineError::OutOfScope(filter.to_string()))
    }

    fn run_query(&self, query: &str, sites: &[&SiteEntry]) -> Result<Vec<SearchResult>, EngineError> {
        let query_lemmas = self.lemmatizer.lemma_set(query);
        if query_lemmas.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        {
            let store = self.storage.lock();
            for entry in sites {
                candidates.extend(self.site_candidates(&*store, entry, &query_lemmas)?);
            }
        }

        let Some(max_relevance) = candidates.iter().map(|c| c.absolute_relevance).max() else {
            return Ok(Vec::new());
        };
        let surface_forms = self
            .lemmatizer
            .ratio_of_query_terms_to_lemmas(query, &query_lemmas);

        let mut results = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if let Some(result) = self.build_result(candidate, max_relevance, &surface_forms)? {
                results.push(result);
            }
        }

        results.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(Ordering::Equal)
        });

        tracing::info!(
            "Query '{}' matched {} pages ({} candidates)",
            query,
            results.len(),
            candidates.len()
        );
        Ok(results)
    }

    /// Pages of one site containing every query lemma
    fn site_candidates(
        &self,
        store: &(dyn Storage + Send),
        entry: &SiteEntry,
        query_lemmas: &HashSet<String>,
    ) -> Result<Vec<Candidate>, EngineError> {
        let Some(site) = store.find_site_by_url(&entry.url)? else {
            return Ok(Vec::new());
        };

        let limit = i64::from(self.config.search.word_rank_limit);
        let mut lemmas = Vec::with_capacity(query_lemmas.len());
        for lemma in query_lemmas {
            match store.find_lemma(site.id, lemma)? {
                None => return Ok(Vec::new()),
                Some(record) if record.frequency > limit => {
                    tracing::debug!(
                        "Ignoring '{}' on {}: frequency {} above {}",
                        lemma,
                        site.url,
                        record.frequency,
                        limit
                    );
                }
                Some(record) => lemmas.push(record),
            }
        }
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        lemmas.sort_by(|a, b| {
            a.frequency
                .cmp(&b.frequency)
                .then_with(|| a.lemma.cmp(&b.lemma))
        });

        let page_ids = intersect_pages(store, &lemmas)?;
        let lemmas = Arc::new(lemmas);

        let mut candidates = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            let mut absolute_relevance = 0;
            for lemma in lemmas.iter() {
                if let Some(entry) = store.find_index_entry(page_id, lemma.id)? {
                    absolute_relevance += entry.word_rank;
                }
            }
            candidates.push(Candidate {
                site: site.clone(),
                page_id,
                lemmas: Arc::clone(&lemmas),
                absolute_relevance,
            });
        }
        Ok(candidates)
    }

    fn build_result(
        &self,
        candidate: &Candidate,
        max_relevance: i64,
        surface_forms: &HashMap<String, String>,
    ) -> Result<Option<SearchResult>, EngineError> {
        let Some(page) = self.storage.lock().get_page(candidate.page_id)? else {
            return Ok(None);
        };

        let words: Vec<String> = candidate
            .lemmas
            .iter()
            .filter_map(|lemma| surface_forms.get(&lemma.lemma).cloned())
            .collect();
        let text = html_to_text(&page.content).to_lowercase();
        let Some(snippet) = self.snippets.build(&text, &words) else {
            tracing::debug!("No snippet for {}, dropping it", page.path);
            return Ok(None);
        };

        let page_path = Url::parse(&page.path)
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| page.path.clone());

        Ok(Some(SearchResult {
            site_url: candidate.site.url.clone(),
            site_name: candidate.site.name.clone(),
            page_path,
            page_title: extract_title(&page.content),
            snippet,
            relevance: relative_relevance(candidate.absolute_relevance, max_relevance),
        }))
    }
}

/// Pages indexed under every lemma, starting from the rarest
///
/// The result keeps the page order of the rarest lemma.
pub(crate) fn intersect_pages(
    store: &(dyn Storage + Send),
    lemmas: &[LemmaRecord],
) -> Result<Vec<i64>, EngineError> {
    let Some((rarest, rest)) = lemmas.split_first() else {
        return Ok(Vec::new());
    };

    let mut pages = store.page_ids_for_lemma(rarest.id)?;
    for lemma in rest {
        if pages.is_empty() {
            break;
        }
        let next: HashSet<i64> = store.page_ids_for_lemma(lemma.id)?.into_iter().collect();
        pages.retain(|page_id| next.contains(page_id));
    }
    Ok(pages)
}

/// Relevance normalized against the best candidate
pub(crate) fn relative_relevance(absolute: i64, max: i64) -> f32 {
    if max <= 0 {
        return 0.0;
    }
    absolute as f32 / max as f32
}
