//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use crate::common::{create_engine, create_test_config, html_page, mount_page};
use lemma_search::crawler::{SiteOutcome, MAIN_PAGE_UNAVAILABLE, STOPPED_BY_USER};
use lemma_search::{SiteStatus, StartOutcome, StopOutcome};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serves an endless chain of pages, each linking to two new ones
struct EndlessPages;

impl Respond for EndlessPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let n: u64 = request
            .url
            .path()
            .strip_prefix("/page-")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let body = format!(
            r#"<p>Леопард номер {}</p><a href="/page-{}">Дальше</a><a href="/page-{}">Ещё</a>"#,
            n,
            2 * n + 1,
            2 * n + 2
        );
        ResponseTemplate::new(200).set_body_raw(html_page("Бесконечный", &body), "text/html")
    }
}

/// Mounts a three-page zoo site with a few links that must not be followed
async fn mount_zoo_site(server: &MockServer) {
    mount_page(
        server,
        "/",
        html_page(
            "Зоопарк",
            r#"<p>Добро пожаловать в зоопарк</p>
            <a href="/animals">Животные</a>
            <a href="/animals#top">Животные ещё раз</a>
            <a href="/price.pdf">Цены</a>
            <a href="https://ria.ru/news">Новости</a>
            <a href="mailto:info@zoo.ru">Почта</a>"#,
        ),
    )
    .await;

    mount_page(
        server,
        "/animals",
        html_page(
            "Животные",
            r#"<p>Леопард и рысь</p>
            <a href="/animals/leopard">Леопард</a>
            <a href="/">Главная</a>"#,
        ),
    )
    .await;

    mount_page(
        server,
        "/animals/leopard",
        html_page(
            "Леопард",
            "<p>Леопард живёт в горах. Леопарды живут и в лесу, леопард охотится ночью.</p>",
        ),
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_cycle() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_zoo_site(&mock_server).await;

    let config = create_test_config(&[(base_url.as_str(), "Зоопарк")], ":memory:");
    let engine = create_engine(config);

    assert_eq!(engine.start_crawl(), StartOutcome::Accepted);
    let report = engine
        .wait_for_crawl()
        .await
        .expect("Crawl was started")
        .expect("Crawl failed");

    assert!(!engine.is_crawling());
    assert!(!report.stopped);
    assert_eq!(
        report.sites,
        vec![(base_url.clone(), SiteOutcome::Indexed { pages: 3 })]
    );

    let storage = engine.storage();
    let store = storage.lock();
    let site = store
        .find_site_by_url(&base_url)
        .unwrap()
        .expect("Site should be recorded");
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error, None);
    assert_eq!(store.count_pages(site.id).unwrap(), 3);

    let leopard = store
        .find_page_by_path(&format!("{}/animals/leopard", base_url))
        .unwrap()
        .expect("Leopard page should be stored");
    assert_eq!(leopard.code, 200);
    assert!(leopard.content.contains("охотится ночью"));

    // Two pages mention the leopard, the home page does not
    let lemma = store
        .find_lemma(site.id, "леопард")
        .unwrap()
        .expect("Lemma should be indexed");
    assert_eq!(lemma.frequency, 2);
    let entry = store
        .find_index_entry(leopard.id, lemma.id)
        .unwrap()
        .expect("Index entry should exist");
    assert!(entry.word_rank >= 3);

    // Prepositions and conjunctions are not indexed
    assert!(store.find_lemma(site.id, "в").unwrap().is_none());
    assert!(store.find_lemma(site.id, "и").unwrap().is_none());
}

#[tokio::test]
async fn test_recrawl_replaces_previous_index() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_zoo_site(&mock_server).await;

    let config = create_test_config(&[(base_url.as_str(), "Зоопарк")], ":memory:");
    let engine = create_engine(config);

    for _ in 0..2 {
        assert_eq!(engine.start_crawl(), StartOutcome::Accepted);
        engine.wait_for_crawl().await.unwrap().unwrap();
    }

    let storage = engine.storage();
    let store = storage.lock();
    let sites = store.list_sites().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(store.count_pages(sites[0].id).unwrap(), 3);

    // Frequencies are rebuilt, not accumulated
    let lemma = store.find_lemma(sites[0].id, "леопард").unwrap().unwrap();
    assert_eq!(lemma.frequency, 2);
}

#[tokio::test]
async fn test_unavailable_main_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&[(base_url.as_str(), "Недоступный")], ":memory:");
    let engine = create_engine(config);

    engine.start_crawl();
    let report = engine.wait_for_crawl().await.unwrap().unwrap();
    assert_eq!(report.total_pages(), 0);

    let storage = engine.storage();
    let store = storage.lock();
    let site = store.find_site_by_url(&base_url).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error.as_deref(), Some(MAIN_PAGE_UNAVAILABLE));
    assert_eq!(store.count_pages(site.id).unwrap(), 0);
}

#[tokio::test]
async fn test_non_html_pages_are_skipped() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        html_page("Главная", r#"<p>Леопард</p><a href="/data">Данные</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&[(base_url.as_str(), "Данные")], ":memory:");
    let engine = create_engine(config);

    engine.start_crawl();
    let report = engine.wait_for_crawl().await.unwrap().unwrap();
    assert_eq!(
        report.sites,
        vec![(base_url.clone(), SiteOutcome::Indexed { pages: 1 })]
    );

    let storage = engine.storage();
    let store = storage.lock();
    assert!(store
        .find_page_by_path(&format!("{}/data", base_url))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // The main page hangs long enough for the stop request to arrive first
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html_page("Медленно", "<p>Леопард</p>"), "text/html")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(
        &[
            (base_url.as_str(), "Медленный"),
            ("http://127.0.0.1:9", "Следующий"),
        ],
        ":memory:",
    );
    let engine = create_engine(config);

    assert_eq!(engine.start_crawl(), StartOutcome::Accepted);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(engine.is_crawling());
    assert_eq!(engine.start_crawl(), StartOutcome::AlreadyRunning);

    let started = Instant::now();
    assert_eq!(engine.stop_crawl().await, StopOutcome::Stopped);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!engine.is_crawling());

    let storage = engine.storage();
    let store = storage.lock();
    let site = store.find_site_by_url(&base_url).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Failed);
    assert_eq!(site.last_error.as_deref(), Some(STOPPED_BY_USER));

    // The remaining site is never started
    assert!(store.find_site_by_url("http://127.0.0.1:9").unwrap().is_none());
    drop(store);

    assert_eq!(engine.stop_crawl().await, StopOutcome::NotRunning);
}

#[tokio::test]
async fn test_time_budget_ends_endless_site() {
    let endless = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(EndlessPages)
        .mount(&endless)
        .await;
    let endless_url = endless.uri();

    let next = MockServer::start().await;
    mount_page(&next, "/", html_page("Следующий", "<p>Рысь</p>")).await;
    let next_url = next.uri();

    let mut config = create_test_config(
        &[
            (endless_url.as_str(), "Бесконечный"),
            (next_url.as_str(), "Следующий"),
        ],
        ":memory:",
    );
    config.crawler.site_time_budget_secs = 1;
    let engine = create_engine(config);

    let started = Instant::now();
    assert_eq!(engine.start_crawl(), StartOutcome::Accepted);
    let report = engine.wait_for_crawl().await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!report.stopped);

    assert_eq!(report.sites.len(), 2);
    assert!(matches!(
        report.sites[0],
        (_, SiteOutcome::Indexed { pages }) if pages > 0
    ));
    assert_eq!(
        report.sites[1],
        (next_url.clone(), SiteOutcome::Indexed { pages: 1 })
    );

    let storage = engine.storage();
    let store = storage.lock();
    let site = store.find_site_by_url(&endless_url).unwrap().unwrap();
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.last_error, None);

    let next_site = store.find_site_by_url(&next_url).unwrap().unwrap();
    assert_eq!(next_site.status, SiteStatus::Indexed);
    assert_eq!(store.count_pages(next_site.id).unwrap(), 1);
}
