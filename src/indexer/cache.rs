//! Per-crawl lemma cache
//!
//! A fast path in front of the store. It is owned by the single loader loop
//! and cleared after every batch; the store stays authoritative.

use crate::storage::LemmaRecord;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct IndexingCache {
    lemmas: HashMap<String, LemmaRecord>,
    indexed: HashSet<(i64, i64)>,
}

impl IndexingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lemma(&self, lemma: &str) -> Option<&LemmaRecord> {
        self.lemmas.get(lemma)
    }

    pub fn remember_lemma(&mut self, record: LemmaRecord) {
        self.lemmas.insert(record.lemma.clone(), record);
    }

    /// Returns true if the (page, lemma) pair was written during this batch
    pub fn is_indexed(&self, page_id: i64, lemma_id: i64) -> bool {
        self.indexed.contains(&(page_id, lemma_id))
    }

    pub fn mark_indexed(&mut self, page_id: i64, lemma_id: i64) {
        self.indexed.insert((page_id, lemma_id));
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty() && self.indexed.is_empty()
    }

    pub fn clear(&mut self) {
        self.lemmas.clear();
        self.indexed.clear();
    }
}
