//! Engine facade
//!
//! Owns the shared pieces (configuration, store, fetcher, indexer, search
//! service) and exposes the operations callers need: starting and stopping
//! a crawl, indexing a single URL, and searching.

use crate::config::{Config, SiteEntry};
use crate::crawler::{CrawlReport, Coordinator, FetchResult, Fetcher};
use crate::indexer::{IndexingCache, PageIndexer};
use crate::lemma::Lemmatizer;
use crate::morphology::{build_morphology, Morphology};
use crate::search::{SearchResponse, SearchService};
use crate::state::SiteStatus;
use crate::storage::{open_storage, shared, NewPage, SharedStorage};
use crate::url::{normalize_url, SiteScope};
use url::Url;
use crate::EngineError;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Result of a crawl start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Accepted,
    AlreadyRunning,
}

/// Result of a crawl stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Result of indexing a single URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexPageOutcome {
    Success,
    /// The URL belongs to none of the configured sites
    OutOfScope,
    /// The page could not be fetched or is not HTML
    FetchFailed,
}

struct RunningCrawl {
    cancel: CancellationToken,
    /// Taken by whoever waits for the crawl
    handle: Option<JoinHandle<Result<CrawlReport, EngineError>>>,
}

/// Pause between checks while waiting for a crawl someone else is joining
const STOP_POLL: Duration = Duration::from_millis(50);

/// Crawler, indexer and search engine behind one handle
pub struct Engine {
    config: Arc<Config>,
    storage: SharedStorage,
    fetcher: Fetcher,
    indexer: PageIndexer,
    coordinator: Coordinator,
    search: Arc<SearchService>,
    active: Arc<AtomicBool>,
    running: Mutex<Option<RunningCrawl>>,
}

impl Engine {
    /// Builds an engine over an existing store and analyzer
    pub fn new(
        config: Config,
        storage: SharedStorage,
        morphology: Arc<dyn Morphology>,
    ) -> Result<Self, EngineError> {
        let config = Arc::new(config);
        let lemmatizer = Lemmatizer::new(morphology);
        let fetcher = Fetcher::new(&config.crawler, &config.user_agent)?;
        let indexer = PageIndexer::new(Arc::clone(&storage), lemmatizer.clone());
        let coordinator = Coordinator::new(
            Arc::clone(&config),
            Arc::clone(&storage),
            fetcher.clone(),
            indexer.clone(),
        );
        let search = Arc::new(SearchService::new(
            Arc::clone(&config),
            Arc::clone(&storage),
            lemmatizer,
        ));

        Ok(Self {
            config,
            storage,
            fetcher,
            indexer,
            coordinator,
            search,
            active: Arc::new(AtomicBool::new(false)),
            running: Mutex::new(None),
        })
    }

    /// Builds an engine from configuration alone
    ///
    /// Opens the SQLite database and loads the morphology dictionary named in
    /// the configuration.
    pub fn from_config(config: Config) -> Result<Self, EngineError> {
        let storage = open_storage(Path::new(&config.storage.database_path))?;
        let morphology = build_morphology(&config.morphology)?;
        Self::new(config, shared(storage), morphology)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    /// Returns true while a crawl is running
    pub fn is_crawling(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Starts crawling every configured site in the background
    ///
    /// Only one crawl may run at a time; a request made while one is active
    /// is rejected. Must be called from within a Tokio runtime.
    pub fn start_crawl(&self) -> StartOutcome {
        // Held until the handle is stored so a stop never sees `active`
        // without its token
        let mut running = self.running.lock();
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Crawl already running, start request rejected");
            return StartOutcome::AlreadyRunning;
        }

        self.search.invalidate();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let coordinator = self.coordinator.clone();
        let search = Arc::clone(&self.search);
        let active = Arc::clone(&self.active);

        let handle = tokio::spawn(async move {
            let result = coordinator.run(token).await;
            if let Err(e) = &result {
                tracing::error!("Crawl failed: {}", e);
            }
            search.invalidate();
            active.store(false, Ordering::SeqCst);
            result
        });

        *running = Some(RunningCrawl {
            cancel,
            handle: Some(handle),
        });
        StartOutcome::Accepted
    }

    /// Stops the running crawl
    ///
    /// The site being crawled is marked FAILED and the remaining sites are
    /// skipped. Waits for the crawl to wind down.
    pub async fn stop_crawl(&self) -> StopOutcome {
        if !self.is_crawling() {
            return StopOutcome::NotRunning;
        }
        let Some((cancel, handle)) = self
            .running
            .lock()
            .as_mut()
            .map(|running| (running.cancel.clone(), running.handle.take()))
        else {
            return StopOutcome::NotRunning;
        };

        tracing::info!("Stopping crawl");
        cancel.cancel();

        let crawler = &self.config.crawler;
        let patience = Duration::from_millis(
            2 * crawler.shutdown_grace_ms + crawler.supervisor_poll_interval_ms,
        );

        match handle {
            Some(handle) => match tokio::time::timeout(patience, handle).await {
                Ok(Ok(Ok(report))) => {
                    tracing::info!("Crawl stopped after {} pages", report.total_pages())
                }
                Ok(Ok(Err(e))) => tracing::error!("Crawl ended with error: {}", e),
                Ok(Err(e)) => tracing::error!("Crawl task failed: {}", e),
                Err(_) => tracing::warn!("Crawl did not stop within {:?}", patience),
            },
            None => {
                let stopped = tokio::time::timeout(patience, async {
                    while self.is_crawling() {
                        tokio::time::sleep(STOP_POLL).await;
                    }
                })
                .await;
                if stopped.is_err() {
                    tracing::warn!("Crawl did not stop within {:?}", patience);
                }
            }
        }

        StopOutcome::Stopped
    }

    /// Waits for the running crawl to finish
    ///
    /// Returns None if no crawl was started or another caller is already
    /// waiting for it.
    pub async fn wait_for_crawl(&self) -> Option<Result<CrawlReport, EngineError>> {
        let handle = self
            .running
            .lock()
            .as_mut()
            .and_then(|running| running.handle.take())?;
        Some(match handle.await {
            Ok(result) => result,
            Err(e) => Err(EngineError::Task(e.to_string())),
        })
    }

    /// Fetches and indexes one page of a configured site
    ///
    /// A page already stored under the same URL is erased first, releasing
    /// its lemma frequencies.
    ///
    /// # Errors
    ///
    /// * `EngineError::UrlError` - The URL is malformed
    /// * Storage failures
    pub async fn index_single_url(&self, url: &str) -> Result<IndexPageOutcome, EngineError> {
        let normalized = normalize_url(url)?;
        let Some(entry) = self.site_for(&normalized) else {
            tracing::warn!("{} is outside of configured sites", url);
            return Ok(IndexPageOutcome::OutOfScope);
        };

        let path = normalized.to_string();
        let (status_code, body) = match self.fetcher.fetch(&path).await {
            FetchResult::Success {
                status_code, body, ..
            } => (status_code, body),
            other => {
                tracing::warn!("Could not fetch {}: {:?}", path, other);
                return Ok(IndexPageOutcome::FetchFailed);
            }
        };

        let (site_id, previous) = {
            let mut store = self.storage.lock();
            let site_id = match store.find_site_by_url(&entry.url)? {
                Some(site) => site.id,
                None => store.insert_site(&entry.url, &entry.name, SiteStatus::Indexed)?.id,
            };
            (site_id, store.find_page_by_path(&path)?)
        };

        if let Some(previous) = previous {
            tracing::info!("Re-indexing {}", path);
            self.indexer.erase_page(previous.id)?;
        }

        let page = self.storage.lock().save_page(&NewPage {
            site_id,
            path,
            code: status_code,
            content: body,
        })?;
        let lemmas = self.indexer.index_page(&page, &mut IndexingCache::new())?;
        self.search.invalidate();

        tracing::info!("Indexed {} ({} lemmas)", page.path, lemmas);
        Ok(IndexPageOutcome::Success)
    }

    /// Searches the index
    ///
    /// See `SearchService::search`.
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<SearchResponse, EngineError> {
        self.search.search(query, site, offset, limit)
    }

    /// Finds the configured site whose scope covers the URL
    fn site_for(&self, url: &Url) -> Option<&SiteEntry> {
        self.config.sites.iter().find(|entry| {
            normalize_url(&entry.url)
                .ok()
                .and_then(|root| SiteScope::new(&root))
                .is_some_and(|scope| scope.contains(url))
        })
    }
}
