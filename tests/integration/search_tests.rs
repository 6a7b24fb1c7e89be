//! Integration tests for search and single-page indexing

use crate::common::{create_engine, create_test_config, html_page, mount_page};
use lemma_search::{Engine, EngineError, IndexPageOutcome};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_mountain_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html_page(
            "Горы",
            r#"<p>Рысь живёт в горах</p>
            <a href="/leopard">Леопард</a>
            <a href="/lynx">Про рысь</a>"#,
        ),
    )
    .await;
    mount_page(
        server,
        "/leopard",
        html_page(
            "Леопард",
            "<p>Леопард живёт в горах. Леопард охотится ночью, леопард спит днём.</p>",
        ),
    )
    .await;
    mount_page(
        server,
        "/lynx",
        html_page("Рысь", "<p>Рысь охотится на зайцев</p>"),
    )
    .await;
}

#[tokio::test]
async fn test_search_crawled_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_mountain_site(&mock_server).await;

    let engine = create_engine(create_test_config(&[(base_url.as_str(), "Горы")], ":memory:"));
    engine.start_crawl();
    engine.wait_for_crawl().await.unwrap().unwrap();

    // "леопард" is on the leopard page and in the home page's link text
    let response = engine.search("леопард", None, 0, 10).unwrap();
    assert_eq!(response.total_count, 2);
    let best = &response.results[0];
    assert_eq!(best.page_path, "/leopard");
    assert_eq!(best.page_title, "Леопард");
    assert_eq!(best.site_url, base_url);
    assert_eq!(best.site_name, "Горы");
    assert_eq!(best.relevance, 1.0);
    assert!(best.snippet.contains("<b>леопард</b>"));
    assert!(response.results[1].relevance < 1.0);

    // Every query word must be on the page
    let response = engine.search("рысь горах", None, 0, 10).unwrap();
    assert_eq!(response.total_count, 1);
    assert_eq!(response.results[0].page_path, "/");
    assert!(response.results[0].snippet.contains("<b>рысь</b>"));
    assert!(response.results[0].snippet.contains("<b>горах</b>"));

    // Restricting to the site with a trailing slash behaves the same
    let filtered = engine
        .search("леопард", Some(&format!("{}/", base_url)), 0, 10)
        .unwrap();
    assert_eq!(filtered.total_count, 2);

    let paged = engine.search("леопард", None, 1, 10).unwrap();
    assert_eq!(paged.total_count, 2);
    assert_eq!(paged.results.len(), 1);
    assert_eq!(paged.results[0].page_path, "/");

    let nothing = engine.search("тигр", None, 0, 10).unwrap();
    assert_eq!(nothing.total_count, 0);
}

#[tokio::test]
async fn test_search_unknown_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let engine = create_engine(create_test_config(&[(base_url.as_str(), "Горы")], ":memory:"));

    let result = engine.search("леопард", Some("https://ria.ru"), 0, 10);
    assert!(matches!(result, Err(EngineError::OutOfScope(_))));
}

#[tokio::test]
async fn test_index_single_url_and_reindex() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(
        &mock_server,
        "/news",
        html_page("Новости", "<p>В зоопарк привезли леопарда</p>"),
    )
    .await;

    let engine = create_engine(create_test_config(&[(base_url.as_str(), "Зоопарк")], ":memory:"));

    let outcome = engine
        .index_single_url(&format!("{}/news", base_url))
        .await
        .unwrap();
    assert_eq!(outcome, IndexPageOutcome::Success);

    let response = engine.search("леопарда", None, 0, 10).unwrap();
    assert_eq!(response.total_count, 1);
    assert_eq!(response.results[0].page_path, "/news");

    // The page changes: the old lemmas must go away with the old content
    mock_server.reset().await;
    mount_page(
        &mock_server,
        "/news",
        html_page("Новости", "<p>В зоопарк привезли рысь</p>"),
    )
    .await;

    let outcome = engine
        .index_single_url(&format!("{}/news?utm=feed", base_url))
        .await
        .unwrap();
    assert_eq!(outcome, IndexPageOutcome::Success);

    assert_eq!(engine.search("леопарда", None, 0, 10).unwrap().total_count, 0);
    let response = engine.search("рысь", None, 0, 10).unwrap();
    assert_eq!(response.total_count, 1);

    let storage = engine.storage();
    let store = storage.lock();
    let site = store.find_site_by_url(&base_url).unwrap().unwrap();
    assert_eq!(store.count_pages(site.id).unwrap(), 1);
    let zoo = store.find_lemma(site.id, "зоопарк").unwrap().unwrap();
    assert_eq!(zoo.frequency, 1);
    let leopard = store.find_lemma(site.id, "леопард").unwrap();
    assert!(leopard.map_or(true, |lemma| lemma.frequency == 0));
}

#[tokio::test]
async fn test_index_single_url_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let engine = create_engine(create_test_config(&[(base_url.as_str(), "Зоопарк")], ":memory:"));

    let outcome = engine
        .index_single_url(&format!("{}/missing", base_url))
        .await
        .unwrap();
    assert_eq!(outcome, IndexPageOutcome::FetchFailed);

    let outcome = engine
        .index_single_url("https://ria.ru/news")
        .await
        .unwrap();
    assert_eq!(outcome, IndexPageOutcome::OutOfScope);
}

#[tokio::test]
async fn test_engine_from_config_files() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_page(
        &mock_server,
        "/",
        html_page("Леопарды", "<p>Леопард живёт в горах. Леопарды тоже.</p>"),
    )
    .await;

    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");

    let mut dictionary = NamedTempFile::new().unwrap();
    writeln!(dictionary, "# form\tlemma\ttag").unwrap();
    writeln!(dictionary, "леопарды\tлеопард\tNOUN").unwrap();
    writeln!(dictionary, "леопард\tлеопард\tNOUN").unwrap();
    writeln!(dictionary, "в\tв\tPREP").unwrap();

    let mut config = create_test_config(
        &[(base_url.as_str(), "Леопарды")],
        db_path.to_str().unwrap(),
    );
    config.morphology.dictionary_path = Some(dictionary.path().display().to_string());

    let engine = Engine::from_config(config.clone()).unwrap();
    engine.start_crawl();
    engine.wait_for_crawl().await.unwrap().unwrap();
    drop(engine);

    // A fresh engine over the same database sees the index
    let engine = Engine::from_config(config).unwrap();
    let response = engine.search("леопард", None, 0, 10).unwrap();
    assert_eq!(response.total_count, 1);
    assert_eq!(response.results[0].page_title, "Леопарды");
    assert!(response.results[0].snippet.contains("<b>леопард</b> живёт"));
}
