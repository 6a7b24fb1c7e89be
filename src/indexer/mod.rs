//! Indexing pipeline
//!
//! - `IndexingCache`: per-crawl fast path for lemma lookups
//! - `PageIndexer`: lemma and word index writes for one page, and erasure
//! - `run_page_loader`: the loop draining the staging buffer

mod cache;
mod loader;
mod page_indexer;

pub use cache::IndexingCache;
pub use loader::{run_page_loader, LoaderSettings};
pub use page_indexer::PageIndexer;
