//! Link frontier: the URLs discovered for the site being crawled
//!
//! Every URL is keyed by its normalized form and moves through
//! `Unvisited → Claimed → Loaded`. Claims are atomic: a URL handed to one
//! worker is never handed to another.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Visitation state of a frontier URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum UrlState {
    /// Discovered, waiting to be fetched
    Unvisited,
    /// Handed to a worker
    Claimed,
    /// Worker finished with it (staged or dropped)
    Loaded,
}

#[derive(Debug, Default)]
struct FrontierInner {
    urls: HashMap<String, UrlState>,
    /// Insertion order, so claims follow discovery order
    order: Vec<String>,
    /// Everything before this position in `order` has been claimed
    cursor: usize,
    /// Per-worker share for the current pass
    share: usize,
    /// Claims left in the current pass
    claims_left: usize,
}

/// Thread-safe registry of discovered URLs
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL as unvisited
    ///
    /// Returns false if the URL was already known.
    pub fn seed(&self, url: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.urls.contains_key(url) {
            return false;
        }
        inner.urls.insert(url.to_string(), UrlState::Unvisited);
        inner.order.push(url.to_string());
        true
    }

    /// Adds every URL that is not already known, returning how many were new
    pub fn insert_all<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut inner = self.inner.lock();
        let mut added = 0;
        for url in urls {
            if !inner.urls.contains_key(&url) {
                inner.urls.insert(url.clone(), UrlState::Unvisited);
                inner.order.push(url);
                added += 1;
            }
        }
        added
    }

    /// Claims up to `max` unvisited URLs, in discovery order
    pub fn claim_batch(&self, max: usize) -> Vec<String> {
        let mut inner = self.inner.lock();
        Self::claim_locked(&mut inner, max)
    }

    /// Claims this worker's fair share of the unvisited URLs
    ///
    /// The share is the unvisited count divided across `workers`, rounded
    /// up. It is computed at the start of a pass and reused until every
    /// worker has taken one claim from that pass.
    pub fn claim_share(&self, workers: usize) -> Vec<String> {
        let workers = workers.max(1);
        let mut inner = self.inner.lock();

        if inner.claims_left == 0 {
            let unvisited = inner.order.len() - inner.cursor;
            inner.share = unvisited.div_ceil(workers).max(1);
            inner.claims_left = workers;
        }
        inner.claims_left -= 1;

        let share = inner.share;
        Self::claim_locked(&mut inner, share)
    }

    fn claim_locked(inner: &mut FrontierInner, max: usize) -> Vec<String> {
        let end = (inner.cursor + max).min(inner.order.len());
        let claimed: Vec<String> = inner.order[inner.cursor..end].to_vec();
        for url in &claimed {
            inner.urls.insert(url.clone(), UrlState::Claimed);
        }
        inner.cursor = end;
        claimed
    }

    /// Marks a claimed URL as done
    pub fn mark_loaded(&self, url: &str) {
        if let Some(state) = self.inner.lock().urls.get_mut(url) {
            *state = UrlState::Loaded;
        }
    }

    pub fn still_has_unvisited(&self) -> bool {
        let inner = self.inner.lock();
        inner.cursor < inner.order.len()
    }

    /// Returns true if some URL is claimed but not yet loaded
    pub fn has_in_flight(&self) -> bool {
        self.inner
            .lock()
            .urls
            .values()
            .any(|state| *state == UrlState::Claimed)
    }

    /// Returns true when no URL is unvisited or in flight
    pub fn is_drained(&self) -> bool {
        self.inner
            .lock()
            .urls
            .values()
            .all(|state| *state == UrlState::Loaded)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().urls.is_empty()
    }

    /// Forgets every URL
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.urls.clear();
        inner.order.clear();
        inner.cursor = 0;
        inner.share = 0;
        inner.claims_left = 0;
    }
}
