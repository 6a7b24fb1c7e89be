//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    IndexRecord, LemmaRecord, LemmaUpsert, NewIndexEntry, NewPage, PageRecord, SiteRecord,
};
use crate::EngineError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, url, name, status, status_time, last_error";
const PAGE_COLUMNS: &str = "id, site_id, path, code, content";
const LEMMA_COLUMNS: &str = "id, site_id, lemma, frequency";
const INDEX_COLUMNS: &str = "id, page_id, lemma_id, word_rank";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(EngineError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, EngineError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, EngineError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(SiteStatus::Failed),
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn lemma_from_row(row: &Row) -> rusqlite::Result<LemmaRecord> {
    Ok(LemmaRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        lemma: row.get(2)?,
        frequency: row.get(3)?,
    })
}

fn index_from_row(row: &Row) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        id: row.get(0)?,
        page_id: row.get(1)?,
        lemma_id: row.get(2)?,
        word_rank: row.get(3)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn insert_site(
        &mut self,
        url: &str,
        name: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time) VALUES (?1, ?2, ?3, ?4)",
            params![url, name, status.to_db_string(), now],
        )?;

        Ok(SiteRecord {
            id: self.conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            status,
            status_time: now,
            last_error: None,
        })
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS),
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sites ORDER BY id", SITE_COLUMNS))?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE sites SET status = ?1, status_time = ?2, last_error = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, last_error, site_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn touch_site(&mut self, site_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
        Ok(())
    }

    // ===== Page Management =====

    fn save_page(&mut self, page: &NewPage) -> StorageResult<PageRecord> {
        self.conn.execute(
            "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![page.site_id, page.path, page.code, page.content],
        )?;

        Ok(PageRecord {
            id: self.conn.last_insert_rowid(),
            site_id: page.site_id,
            path: page.path.clone(),
            code: page.code,
            content: page.content.clone(),
        })
    }

    fn save_pages(&mut self, pages: &[NewPage]) -> StorageResult<Vec<PageRecord>> {
        let tx = self.conn.transaction()?;
        let mut saved = Vec::with_capacity(pages.len());

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            )?;

            for page in pages {
                let inserted = stmt.execute(params![page.site_id, page.path, page.code, page.content])?;
                if inserted == 0 {
                    tracing::debug!("Page {} already stored, skipping", page.path);
                    continue;
                }

                saved.push(PageRecord {
                    id: tx.last_insert_rowid(),
                    site_id: page.site_id,
                    path: page.path.clone(),
                    code: page.code,
                    content: page.content.clone(),
                });
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn find_page_by_path(&self, path: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE path = ?1", PAGE_COLUMNS),
                params![path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn delete_page(&mut self, page_id: i64) -> StorageResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        if deleted == 0 {
            return Err(StorageError::PageNotFound(page_id.to_string()));
        }
        Ok(())
    }

    fn count_pages(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Lemma Management =====

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
            LEMMA_COLUMNS
        ))?;
        let mut rows = stmt
            .query_map(params![site_id, lemma], lemma_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.len() > 1 {
            return Err(StorageError::Consistency {
                lemma: lemma.to_string(),
                site_id,
                rows: rows.len(),
            });
        }

        Ok(rows.pop())
    }

    fn save_lemmas(
        &mut self,
        site_id: i64,
        lemmas: &[LemmaUpsert],
    ) -> StorageResult<Vec<LemmaRecord>> {
        let tx = self.conn.transaction()?;
        let mut saved = Vec::with_capacity(lemmas.len());

        {
            let mut insert = tx.prepare(
                "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, ?3)
                 ON CONFLICT(site_id, lemma) DO UPDATE SET frequency = excluded.frequency",
            )?;
            let mut update = tx.prepare("UPDATE lemmas SET frequency = ?1 WHERE id = ?2")?;
            let mut lookup = tx.prepare("SELECT id FROM lemmas WHERE site_id = ?1 AND lemma = ?2")?;

            for lemma in lemmas {
                let id = match lemma.id {
                    Some(id) => {
                        update.execute(params![lemma.frequency, id])?;
                        id
                    }
                    None => {
                        insert.execute(params![site_id, lemma.lemma, lemma.frequency])?;
                        lookup.query_row(params![site_id, lemma.lemma], |row| row.get(0))?
                    }
                };

                saved.push(LemmaRecord {
                    id,
                    site_id,
                    lemma: lemma.lemma.clone(),
                    frequency: lemma.frequency,
                });
            }
        }

        tx.commit()?;
        Ok(saved)
    }

    fn decrement_lemma_frequency(&mut self, lemma_id: i64) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE lemmas SET frequency = frequency - 1 WHERE id = ?1",
            params![lemma_id],
        )?;
        self.conn.execute(
            "DELETE FROM lemmas WHERE id = ?1 AND frequency <= 0",
            params![lemma_id],
        )?;
        Ok(())
    }

    fn count_lemmas(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Index Management =====

    fn save_index_entries(&mut self, entries: &[NewIndexEntry]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO word_index (page_id, lemma_id, word_rank) VALUES (?1, ?2, ?3)
                 ON CONFLICT(page_id, lemma_id) DO UPDATE SET word_rank = excluded.word_rank",
            )?;
            for entry in entries {
                stmt.execute(params![entry.page_id, entry.lemma_id, entry.word_rank])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn find_index_entry(
        &self,
        page_id: i64,
        lemma_id: i64,
    ) -> StorageResult<Option<IndexRecord>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM word_index WHERE page_id = ?1 AND lemma_id = ?2",
                    INDEX_COLUMNS
                ),
                params![page_id, lemma_id],
                index_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn index_entries_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM word_index WHERE page_id = ?1 ORDER BY id",
            INDEX_COLUMNS
        ))?;
        let entries = stmt
            .query_map(params![page_id], index_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn page_ids_for_lemma(&self, lemma_id: i64) -> StorageResult<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id FROM word_index WHERE lemma_id = ?1 ORDER BY page_id")?;
        let ids = stmt
            .query_map(params![lemma_id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn delete_index_entries_for_page(&mut self, page_id: i64) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM word_index WHERE page_id = ?1", params![page_id])?;
        Ok(())
    }
}
