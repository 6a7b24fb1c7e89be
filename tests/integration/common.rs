//! Shared helpers for the integration tests

use lemma_search::config::{
    Config, CrawlerConfig, MorphologyConfig, SearchConfig, SiteEntry, StorageConfig,
    UserAgentConfig,
};
use lemma_search::morphology::{DictionaryMorphology, Morphology, SnowballMorphology};
use lemma_search::storage::{shared, SqliteStorage};
use lemma_search::Engine;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given sites
///
/// Delays and polling intervals are shortened so a small site is crawled
/// in well under a second.
pub fn create_test_config(sites: &[(&str, &str)], db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_workers: Some(2),
            request_timeout_secs: 5,
            site_time_budget_secs: 30,
            batch_size: 10,
            comfortable_batch_size: 2,
            initial_fetch_delay_ms: 10,
            min_fetch_delay_ms: 0,
            delay_increase_step_ms: 10,
            delay_decrease_step_ms: 5,
            loader_idle_backoff_ms: 20,
            supervisor_poll_interval_ms: 20,
            shutdown_grace_ms: 1000,
        },
        user_agent: UserAgentConfig::default(),
        search: SearchConfig {
            word_rank_limit: 100,
            snippet_interval: 30,
        },
        storage: StorageConfig {
            database_path: db_path.to_string(),
        },
        morphology: MorphologyConfig::default(),
        sites: sites
            .iter()
            .map(|(url, name)| SiteEntry {
                url: url.to_string(),
                name: name.to_string(),
            })
            .collect(),
    }
}

/// Dictionary covering the words used by the test pages
pub fn test_morphology() -> Arc<dyn Morphology> {
    Arc::new(DictionaryMorphology::from_entries(
        [
            ("леопард", "леопард", "NOUN"),
            ("леопарда", "леопард", "NOUN"),
            ("леопарды", "леопард", "NOUN"),
            ("рысь", "рысь", "NOUN"),
            ("рыси", "рысь", "NOUN"),
            ("горах", "гора", "NOUN"),
            ("горы", "гора", "NOUN"),
            ("живёт", "жить", "VERB"),
            ("живут", "жить", "VERB"),
            ("зоопарк", "зоопарк", "NOUN"),
            ("в", "в", "PREP"),
            ("и", "и", "CONJ"),
        ],
        Box::new(SnowballMorphology::new()),
    ))
}

/// Builds an engine over an in-memory store
pub fn create_engine(config: Config) -> Engine {
    let storage = shared(SqliteStorage::new_in_memory().expect("Failed to open in-memory store"));
    Engine::new(config, storage, test_morphology()).expect("Failed to create engine")
}

/// Wraps a body into a minimal HTML document
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

/// Serves an HTML page at the given path
pub async fn mount_page(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}
