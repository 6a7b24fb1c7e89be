//! Crawl coordinator - per-site supervision
//!
//! Sites are crawled one after another. For each site the coordinator:
//! - Purges the previous crawl of the site and marks it INDEXING
//! - Seeds the frontier with the site root
//! - Launches the fetch workers and the page loader
//! - Polls until the site is complete, the time budget runs out or the crawl
//!   is stopped
//! - Cancels the tasks, waits for them within the grace period and records
//!   the final site status

use crate::config::{Config, SiteEntry};
use crate::crawler::{run_fetch_worker, CrawlSession, Fetcher};
use crate::indexer::{run_page_loader, LoaderSettings, PageIndexer};
use crate::state::SiteStatus;
use crate::storage::SharedStorage;
use crate::url::{normalize_url, SiteScope};
use crate::{EngineError, UrlError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Last error recorded for a site interrupted by a stop request
pub const STOPPED_BY_USER: &str = "Indexing was stopped by user";

/// Last error recorded for a site that yielded no pages
pub const MAIN_PAGE_UNAVAILABLE: &str = "Main page is unavailable";

/// How the crawl of one site ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    /// Crawl finished or ran out of time
    Indexed { pages: u64 },
    /// A stop request interrupted the crawl
    Stopped,
    /// The loader or a worker failed
    Failed(String),
}

/// Summary of a crawl over all configured sites
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub sites: Vec<(String, SiteOutcome)>,
    pub stopped: bool,
}

impl CrawlReport {
    pub fn total_pages(&self) -> u64 {
        self.sites
            .iter()
            .map(|(_, outcome)| match outcome {
                SiteOutcome::Indexed { pages } => *pages,
                _ => 0,
            })
            .sum()
    }
}

/// Main crawler coordinator structure
#[derive(Clone)]
pub struct Coordinator {
    config: Arc<Config>,
    storage: SharedStorage,
    fetcher: Fetcher,
    indexer: PageIndexer,
}

impl Coordinator {
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        fetcher: Fetcher,
        indexer: PageIndexer,
    ) -> Self {
        Self {
            config,
            storage,
            fetcher,
            indexer,
        }
    }

    /// Number of fetch workers per site
    ///
    /// One unit of available parallelism is kept for the loader.
    pub fn worker_count(&self) -> usize {
        self.config.crawler.fetch_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
                .saturating_sub(1)
                .max(1)
        })
    }

    /// Crawls every configured site in order
    ///
    /// A stop request ends the current site and skips the rest. A site that
    /// cannot be set up is logged and skipped.
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlReport, EngineError> {
        let start_time = Instant::now();
        let mut report = CrawlReport::default();

        tracing::info!("Starting crawl of {} sites", self.config.sites.len());

        for entry in &self.config.sites {
            if cancel.is_cancelled() {
                report.stopped = true;
                break;
            }

            match self.crawl_site(entry, &cancel).await {
                Ok(outcome) => {
                    let stopped = outcome == SiteOutcome::Stopped;
                    report.sites.push((entry.url.clone(), outcome));
                    if stopped {
                        report.stopped = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Crawl of {} failed: {}", entry.url, e);
                    report
                        .sites
                        .push((entry.url.clone(), SiteOutcome::Failed(e.to_string())));
                }
            }
        }

        tracing::info!(
            "Crawl completed: {} pages across {} sites in {:?}",
            report.total_pages(),
            report.sites.len(),
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Crawls a single site
    pub async fn crawl_site(
        &self,
        entry: &SiteEntry,
        cancel: &CancellationToken,
    ) -> Result<SiteOutcome, EngineError> {
        let root = normalize_url(&entry.url)?;
        let scope = SiteScope::new(&root).ok_or(UrlError::MissingHost)?;

        let site = {
            let mut store = self.storage.lock();
            if let Some(previous) = store.find_site_by_url(&entry.url)? {
                tracing::info!("Purging previous index of {}", entry.url);
                store.delete_site(previous.id)?;
            }
            store.insert_site(&entry.url, &entry.name, SiteStatus::Indexing)?
        };

        let session = Arc::new(CrawlSession::new(site, scope, &self.config.crawler));
        session.frontier.seed(root.as_str());

        self.supervise(&session, cancel).await
    }

    /// Runs the tasks of a prepared session and records the site status
    ///
    /// The session's transient state is cleared on the way out, whether the
    /// site finished, failed or was stopped.
    async fn supervise(
        &self,
        session: &Arc<CrawlSession>,
        cancel: &CancellationToken,
    ) -> Result<SiteOutcome, EngineError> {
        let crawler = &self.config.crawler;
        let site_url = session.site.url.clone();
        let site_id = session.site_id();

        let workers = self.worker_count();
        tracing::info!(
            "Crawling {} ({}) with {} fetch workers",
            session.site.name,
            site_url,
            workers
        );

        let site_token = cancel.child_token();
        let mut tasks: JoinSet<Result<(), EngineError>> = JoinSet::new();

        for worker_id in 0..workers {
            session.worker_started();
            tasks.spawn(run_fetch_worker(
                worker_id,
                Arc::clone(session),
                self.fetcher.clone(),
                site_token.clone(),
            ));
        }
        tasks.spawn(run_page_loader(
            Arc::clone(session),
            Arc::clone(&self.storage),
            self.indexer.clone(),
            LoaderSettings {
                batch_size: crawler.batch_size,
                idle_backoff: Duration::from_millis(crawler.loader_idle_backoff_ms),
            },
            site_token.clone(),
        ));

        let started = Instant::now();
        let budget = Duration::from_secs(crawler.site_time_budget_secs);
        let mut ticker = tokio::time::interval(Duration::from_millis(
            crawler.supervisor_poll_interval_ms,
        ));
        let mut failure: Option<EngineError> = None;

        let mut forced = loop {
            tokio::select! {
                _ = cancel.cancelled() => break true,
                Some(joined) = tasks.join_next() => {
                    if let Some(e) = task_error(joined) {
                        tracing::error!("Crawl task for {} failed: {}", site_url, e);
                        failure = Some(e);
                        break false;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            if session.is_complete() {
                tracing::info!("{} fully crawled in {:?}", site_url, started.elapsed());
                break false;
            }
            if started.elapsed() >= budget {
                tracing::warn!(
                    "Time budget of {:?} exhausted for {}, finishing early",
                    budget,
                    site_url
                );
                break false;
            }
        };

        site_token.cancel();
        let grace = Duration::from_millis(crawler.shutdown_grace_ms);
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                if let Some(e) = task_error(joined) {
                    tracing::warn!("Crawl task for {} failed during shutdown: {}", site_url, e);
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                "Tasks for {} did not stop within {:?}, aborting",
                site_url,
                grace
            );
            tasks.abort_all();
        }
        forced |= cancel.is_cancelled();
        session.clear();

        let mut store = self.storage.lock();
        let pages = store.count_pages(site_id)?;
        let outcome = if forced {
            store.update_site_status(site_id, SiteStatus::Failed, Some(STOPPED_BY_USER))?;
            SiteOutcome::Stopped
        } else if let Some(e) = failure {
            let message = e.to_string();
            store.update_site_status(site_id, SiteStatus::Failed, Some(&message))?;
            SiteOutcome::Failed(message)
        } else {
            let last_error = (pages == 0).then_some(MAIN_PAGE_UNAVAILABLE);
            store.update_site_status(site_id, SiteStatus::Indexed, last_error)?;
            SiteOutcome::Indexed { pages }
        };
        drop(store);

        tracing::info!("Site {} finished: {:?} ({} pages)", site_url, outcome, pages);

        Ok(outcome)
    }
}

/// Extracts a real failure from a finished task, ignoring cancellation
fn task_error(joined: Result<Result<(), EngineError>, JoinError>) -> Option<EngineError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) if e.is_cancelled() => None,
        Ok(Err(e)) => Some(e),
        Err(e) if e.is_cancelled() => None,
        Err(e) => Some(EngineError::Task(e.to_string())),
    }
}
