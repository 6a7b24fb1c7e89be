//! Page loader loop
//!
//! The single consumer of the staging buffer: persists staged pages in
//! batches, indexes them and reports batch sizes to the throttle.

use crate::crawler::{sleep_or_cancel, CrawlSession};
use crate::indexer::{IndexingCache, PageIndexer};
use crate::storage::{NewPage, SharedStorage};
use crate::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Loader tunables
#[derive(Debug, Clone, Copy)]
pub struct LoaderSettings {
    pub batch_size: usize,
    pub idle_backoff: Duration,
}

/// Runs the loader until cancelled
///
/// The loop never finishes on its own; the supervisor cancels it once the
/// site is complete.
///
/// # Errors
///
/// Returns `EngineError::Cancelled` when the token fires, or the first
/// storage error.
pub async fn run_page_loader(
    session: Arc<CrawlSession>,
    storage: SharedStorage,
    indexer: PageIndexer,
    settings: LoaderSettings,
    cancel: CancellationToken,
) -> Result<(), EngineError> {
    let mut cache = IndexingCache::new();

    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        if session.staging.is_empty() {
            session.set_loader_idle(true);
            session.throttle.observe_batch(0);
            sleep_or_cancel(settings.idle_backoff, &cancel).await?;
            continue;
        }

        session.set_loader_idle(false);
        let batch = session.staging.drain(settings.batch_size);
        session.throttle.observe_batch(batch.len());

        let pages: Vec<NewPage> = batch
            .into_iter()
            .map(|staged| NewPage {
                site_id: session.site_id(),
                path: staged.url,
                code: staged.status_code,
                content: staged.html,
            })
            .collect();

        let saved = {
            let mut store = storage.lock();
            let saved = store.save_pages(&pages)?;
            store.touch_site(session.site_id())?;
            saved
        };
        tracing::debug!(
            "Persisted {} of {} staged pages for {}",
            saved.len(),
            pages.len(),
            session.site.url
        );

        for page in &saved {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            indexer.index_page(page, &mut cache)?;
        }

        cache.clear();
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::crawler::StagedPage;
    use crate::lemma::Lemmatizer;
    use crate::morphology::SnowballMorphology;
    use crate::state::SiteStatus;
    use crate::storage::{shared, SqliteStorage, Storage};
    use crate::url::SiteScope;
    use url::Url;

    fn setup() -> (Arc<CrawlSession>, SharedStorage, PageIndexer) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let site = storage
            .insert_site("https://zoo.ru", "Зоопарк", SiteStatus::Indexing)
            .unwrap();
        let storage = shared(storage);
        let root = Url::parse("https://zoo.ru/").unwrap();
        let session = Arc::new(CrawlSession::new(
            site,
            SiteScope::new(&root).unwrap(),
            &CrawlerConfig::default(),
        ));
        let indexer = PageIndexer::new(
            Arc::clone(&storage),
            Lemmatizer::new(Arc::new(SnowballMorphology::new())),
        );
        (session, storage, indexer)
    }

    fn settings() -> LoaderSettings {
        LoaderSettings {
            batch_size: 2,
            idle_backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_loader_persists_and_indexes_staged_pages() {
        let (session, storage, indexer) = setup();
        for i in 0..5 {
            session.staging.push(StagedPage {
                url: format!("https://zoo.ru/{}", i),
                status_code: 200,
                html: "<p>Леопард живёт в горах</p>".to_string(),
            });
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_page_loader(
            Arc::clone(&session),
            Arc::clone(&storage),
            indexer,
            settings(),
            cancel.clone(),
        ));

        let site_id = session.site_id();
        for _ in 0..200 {
            if session.loader_idle() && storage.lock().count_pages(site_id).unwrap() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        cancel.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(EngineError::Cancelled)));

        let store = storage.lock();
        assert_eq!(store.count_pages(site_id).unwrap(), 5);
        assert!(store.count_lemmas(site_id).unwrap() > 0);
        assert!(session.staging.is_empty());
    }

    #[tokio::test]
    async fn test_loader_stops_promptly_when_idle() {
        let (session, storage, indexer) = setup();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_page_loader(
            session,
            storage,
            indexer,
            LoaderSettings {
                batch_size: 200,
                idle_backoff: Duration::from_secs(60),
            },
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loader did not stop")
            .unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }
}
