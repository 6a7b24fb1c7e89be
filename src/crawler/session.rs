//! State of one site crawl, shared by its workers, its loader and the supervisor

use crate::config::CrawlerConfig;
use crate::crawler::{Frontier, StagingBuffer, Throttle};
use crate::storage::SiteRecord;
use crate::url::SiteScope;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Everything scoped to the crawl of a single site
///
/// A session is created when the site crawl starts and handed to each task
/// behind an `Arc`. Nothing in it outlives the site.
#[derive(Debug)]
pub struct CrawlSession {
    pub site: SiteRecord,
    pub scope: SiteScope,
    pub frontier: Frontier,
    pub staging: StagingBuffer,
    pub throttle: Throttle,
    loader_idle: AtomicBool,
    active_workers: AtomicUsize,
}

impl CrawlSession {
    pub fn new(site: SiteRecord, scope: SiteScope, config: &CrawlerConfig) -> Self {
        Self {
            site,
            scope,
            frontier: Frontier::new(),
            staging: StagingBuffer::new(),
            throttle: Throttle::new(config),
            loader_idle: AtomicBool::new(false),
            active_workers: AtomicUsize::new(0),
        }
    }

    pub fn site_id(&self) -> i64 {
        self.site.id
    }

    pub fn set_loader_idle(&self, idle: bool) {
        self.loader_idle.store(idle, Ordering::SeqCst);
    }

    pub fn loader_idle(&self) -> bool {
        self.loader_idle.load(Ordering::SeqCst)
    }

    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    /// Returns true when there is nothing left to fetch, stage or index
    pub fn is_complete(&self) -> bool {
        self.active_workers() == 0
            && self.frontier.is_drained()
            && self.staging.is_empty()
            && self.loader_idle()
    }

    /// Drops all transient state
    pub fn clear(&self) {
        self.frontier.clear();
        self.staging.clear();
    }
}
