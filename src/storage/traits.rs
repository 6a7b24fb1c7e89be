//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::SiteStatus;
use crate::storage::{
    IndexRecord, LemmaRecord, LemmaUpsert, NewIndexEntry, NewPage, PageRecord, SiteRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Site not found: {0}")]
    SiteNotFound(i64),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Lemma '{lemma}' has {rows} rows for site {site_id}, expected at most one")]
    Consistency {
        lemma: String,
        site_id: i64,
        rows: usize,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all persistence operations needed by the crawler,
/// the loader and the search service. Batch operations are expected to be
/// atomic per call, but nothing spans a page and its index.
pub trait Storage {
    // ===== Site Management =====

    /// Creates a new site row
    fn insert_site(&mut self, url: &str, name: &str, status: SiteStatus)
        -> StorageResult<SiteRecord>;

    /// Gets a site by its configured root URL
    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>>;

    /// Gets all sites
    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>>;

    /// Sets the status and last error of a site, refreshing its status time
    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()>;

    /// Refreshes the status time of a site
    fn touch_site(&mut self, site_id: i64) -> StorageResult<()>;

    /// Deletes a site with all of its pages, lemmas and index entries
    fn delete_site(&mut self, site_id: i64) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts a single page
    fn save_page(&mut self, page: &NewPage) -> StorageResult<PageRecord>;

    /// Inserts a batch of pages
    ///
    /// Pages whose path already exists are skipped; only inserted pages are
    /// returned.
    fn save_pages(&mut self, pages: &[NewPage]) -> StorageResult<Vec<PageRecord>>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>>;

    /// Gets a page by its canonical URL
    fn find_page_by_path(&self, path: &str) -> StorageResult<Option<PageRecord>>;

    /// Deletes a page and its index entries
    fn delete_page(&mut self, page_id: i64) -> StorageResult<()>;

    /// Counts the pages of a site
    fn count_pages(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Lemma Management =====

    /// Finds a lemma of a site
    ///
    /// Returns `StorageError::Consistency` if more than one row matches.
    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>>;

    /// Inserts new lemmas and updates the frequency of known ones
    ///
    /// Returns the stored records in input order.
    fn save_lemmas(
        &mut self,
        site_id: i64,
        lemmas: &[LemmaUpsert],
    ) -> StorageResult<Vec<LemmaRecord>>;

    /// Decrements a lemma's frequency, deleting it when no page references it
    fn decrement_lemma_frequency(&mut self, lemma_id: i64) -> StorageResult<()>;

    /// Counts the lemmas of a site
    fn count_lemmas(&self, site_id: i64) -> StorageResult<u64>;

    // ===== Index Management =====

    /// Writes a batch of index entries; an existing (page, lemma) pair is overwritten
    fn save_index_entries(&mut self, entries: &[NewIndexEntry]) -> StorageResult<()>;

    /// Gets the index entry of a (page, lemma) pair
    fn find_index_entry(&self, page_id: i64, lemma_id: i64)
        -> StorageResult<Option<IndexRecord>>;

    /// Gets all index entries of a page
    fn index_entries_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>>;

    /// Gets the IDs of all pages indexed under a lemma, in page ID order
    fn page_ids_for_lemma(&self, lemma_id: i64) -> StorageResult<Vec<i64>>;

    /// Deletes all index entries of a page
    fn delete_index_entries_for_page(&mut self, page_id: i64) -> StorageResult<()>;
}
