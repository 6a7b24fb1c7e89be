//! Writes lemma and word index rows for a page

use crate::indexer::IndexingCache;
use crate::lemma::{html_to_text, Lemmatizer};
use crate::storage::{
    LemmaRecord, LemmaUpsert, NewIndexEntry, PageRecord, SharedStorage, Storage, StorageError,
};
use crate::EngineError;

/// Turns stored pages into lemma and word index rows
#[derive(Clone)]
pub struct PageIndexer {
    storage: SharedStorage,
    lemmatizer: Lemmatizer,
}

impl PageIndexer {
    pub fn new(storage: SharedStorage, lemmatizer: Lemmatizer) -> Self {
        Self {
            storage,
            lemmatizer,
        }
    }

    /// Indexes a stored page
    ///
    /// A lemma new to the site is saved with frequency 1. A known lemma gets
    /// frequency + 1, unless this page is already indexed under it. One index
    /// entry per lemma is written with the lemma's occurrence count as word
    /// rank.
    ///
    /// # Returns
    ///
    /// The number of distinct lemmas indexed for the page.
    ///
    /// # Errors
    ///
    /// A lemma with more than one row for the site is logged and returned
    /// as an error.
    pub fn index_page(
        &self,
        page: &PageRecord,
        cache: &mut IndexingCache,
    ) -> Result<usize, EngineError> {
        let counts = self.lemmatizer.extract_lemmas(&html_to_text(&page.content));
        if counts.is_empty() {
            return Ok(0);
        }

        let mut lemmas: Vec<(&String, &usize)> = counts.iter().collect();
        lemmas.sort();

        let mut store = self.storage.lock();
        let mut upserts = Vec::with_capacity(lemmas.len());

        for (lemma, _) in &lemmas {
            let known = match cache.lemma(lemma) {
                Some(record) => Some(record.clone()),
                None => lookup_lemma(&*store, page, lemma)?,
            };

            let upsert = match known {
                Some(record) => {
                    let already_indexed = cache.is_indexed(page.id, record.id)
                        || store.find_index_entry(page.id, record.id)?.is_some();
                    let frequency = if already_indexed {
                        record.frequency
                    } else {
                        record.frequency + 1
                    };
                    LemmaUpsert {
                        id: Some(record.id),
                        lemma: record.lemma,
                        frequency,
                    }
                }
                None => LemmaUpsert {
                    id: None,
                    lemma: (*lemma).clone(),
                    frequency: 1,
                },
            };
            upserts.push(upsert);
        }

        let saved = store.save_lemmas(page.site_id, &upserts)?;

        let entries: Vec<NewIndexEntry> = saved
            .iter()
            .map(|record| NewIndexEntry {
                page_id: page.id,
                lemma_id: record.id,
                word_rank: counts.get(&record.lemma).copied().unwrap_or(0) as i64,
            })
            .collect();
        store.save_index_entries(&entries)?;
        drop(store);

        for record in saved {
            cache.mark_indexed(page.id, record.id);
            cache.remember_lemma(record);
        }

        tracing::debug!("Indexed {} lemmas for {}", entries.len(), page.path);
        Ok(entries.len())
    }

    /// Removes a page together with its index
    ///
    /// Every lemma referenced by the page loses one unit of frequency; lemmas
    /// left with none are deleted.
    pub fn erase_page(&self, page_id: i64) -> Result<(), EngineError> {
        let mut store = self.storage.lock();

        let entries = store.index_entries_for_page(page_id)?;
        for entry in &entries {
            store.decrement_lemma_frequency(entry.lemma_id)?;
        }
        store.delete_index_entries_for_page(page_id)?;
        store.delete_page(page_id)?;

        tracing::debug!("Erased page {} ({} index entries)", page_id, entries.len());
        Ok(())
    }
}

fn lookup_lemma(
    store: &(dyn Storage + Send),
    page: &PageRecord,
    lemma: &str,
) -> Result<Option<LemmaRecord>, EngineError> {
    match store.find_lemma(page.site_id, lemma) {
        Ok(record) => Ok(record),
        Err(e @ StorageError::Consistency { .. }) => {
            tracing::error!(
                "Lemma '{}' is not unique for site {} while indexing {}: {}",
                lemma,
                page.site_id,
                page.path,
                e
            );
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
