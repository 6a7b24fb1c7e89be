//! Storage module for persisting sites, pages and the lemma index
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Site status tracking
//! - Page persistence
//! - Lemma and word index persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::SiteStatus;
use crate::EngineError;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// A storage backend shared between the crawler, the loader and the search service
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(EngineError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, EngineError> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing between tasks
pub fn shared<S: Storage + Send + 'static>(storage: S) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Represents a site in the database
#[derive(Debug, Clone)]
pub struct SiteRecord {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: String,
    pub last_error: Option<String>,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: i64,
    /// Canonical absolute URL of the page
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// A page about to be inserted
#[derive(Debug, Clone)]
pub struct NewPage {
    pub site_id: i64,
    pub path: String,
    pub code: u16,
    pub content: String,
}

/// Represents a lemma in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LemmaRecord {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    /// Number of pages of the site containing the lemma
    pub frequency: i64,
}

/// A lemma to insert (no id yet) or update (known id)
#[derive(Debug, Clone)]
pub struct LemmaUpsert {
    pub id: Option<i64>,
    pub lemma: String,
    pub frequency: i64,
}

/// Represents a word index entry in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    /// Occurrences of the lemma on the page
    pub word_rank: i64,
}

/// A word index entry about to be written
#[derive(Debug, Clone)]
pub struct NewIndexEntry {
    pub page_id: i64,
    pub lemma_id: i64,
    pub word_rank: i64,
}
