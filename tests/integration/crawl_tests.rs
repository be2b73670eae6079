//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site subtree and run full
//! dataset crawls against it, including reruns over the same database.

use std::time::Duration;
use subtree_crawler::config::{BoundaryConfig, Config, CrawlerConfig, DatasetEntry, OutputConfig};
use subtree_crawler::crawler::{Runner, Target};
use subtree_crawler::storage::{RunStatus, SqliteStorage, Storage};
use subtree_crawler::CrawlError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATASET: &str = "tiny";

/// Creates a config crawling the given datasets over plain HTTP
fn create_test_config(datasets: Vec<DatasetEntry>, db_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            fetch_timeout_secs: 5,
            canonical_scheme: "http".to_string(),
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
        },
        boundary: BoundaryConfig {
            owner_segment: Some("~owner".to_string()),
        },
        datasets,
        ..Config::default()
    }
}

fn seed_of(server: &MockServer) -> String {
    format!("{}/~owner/set/N-0.html", server.uri())
}

fn page_url(server: &MockServer, page: &str) -> String {
    format!("{}/~owner/set/{}", server.uri(), page)
}

fn in_memory_runner(config: Config) -> Runner {
    let storage = SqliteStorage::open_in_memory().expect("in-memory database");
    Runner::new(config, storage, "test-hash").expect("runner")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/~owner/set/{}", page)))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_records_pages_and_in_boundary_edges() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "N-0.html",
        r#"<a href="N-1.html">one</a> <a href="https://external.example/x">external</a>"#,
    )
    .await;
    mount_page(&server, "N-1.html", r#"<a href="N-0.html">back</a>"#).await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 2);
    assert_eq!(report.failed, 0);

    let storage = runner.storage();
    let seed = page_url(&server, "N-0.html");
    let one = page_url(&server, "N-1.html");

    let seed_page = storage.get_page(DATASET, &seed).unwrap().expect("seed page");
    assert_eq!(seed_page.status, 200);
    assert!(seed_page.is_complete());
    assert_eq!(seed_page.out_links.len(), 1);
    assert_eq!(seed_page.out_links[0].as_str(), one);

    assert!(storage.get_page(DATASET, &one).unwrap().is_some());
    assert!(storage
        .get_page(DATASET, "https://external.example/x")
        .unwrap()
        .is_none());
    assert_eq!(storage.count_pages(DATASET).unwrap(), 2);

    let edges = storage.get_edges_from(DATASET, &seed).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to.as_str(), one);

    // N-0 -> N-1 and N-1 -> N-0; nothing towards the external host
    assert_eq!(storage.count_edges(DATASET).unwrap(), 2);
}

#[tokio::test]
async fn test_seed_timeout_is_recorded_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/~owner/set/N-0.html"))
        .respond_with(html(r#"<a href="N-1.html">one</a>"#).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config =
        create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    config.crawler.fetch_timeout_secs = 1;
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl completes");
    assert_eq!(report.failed, 1);
    assert_eq!(report.fetched, 0);
    assert_eq!(report.processed(), 1);

    let seed = seed_of(&server);
    let page = runner
        .storage()
        .get_page(DATASET, &seed)
        .unwrap()
        .expect("failure record");
    assert_eq!(page.status, 0);
    assert!(page.html.is_none());
    assert!(page.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(page.out_links.is_empty());
    assert!(runner
        .storage()
        .get_edges_from(DATASET, &seed)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_http_error_is_recorded_with_status() {
    let server = MockServer::start().await;

    mount_page(&server, "N-0.html", r#"<a href="missing.html">gone</a>"#).await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 1);
    assert_eq!(report.failed, 1);

    let missing = runner
        .storage()
        .get_page(DATASET, &page_url(&server, "missing.html"))
        .unwrap()
        .expect("failure record");
    assert_eq!(missing.status, 404);
    assert_eq!(missing.error.as_deref(), Some("HTTP 404"));
    assert_eq!(runner.storage().count_failed_pages(DATASET).unwrap(), 1);
}

#[tokio::test]
async fn test_rerun_skips_complete_pages_and_creates_no_duplicates() {
    let server = MockServer::start().await;

    // Each page must be requested exactly once across both runs
    Mock::given(method("GET"))
        .and(path("/~owner/set/N-0.html"))
        .respond_with(html(r#"<a href="N-1.html">one</a><a href="N-2.html">two</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~owner/set/N-1.html"))
        .respond_with(html(r#"<a href="N-2.html">two</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~owner/set/N-2.html"))
        .respond_with(html(r#"<a href="N-0.html">zero</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let first = runner.crawl_dataset(DATASET).await.expect("first crawl");
    assert_eq!(first.fetched, 3);

    let pages = runner.storage().count_pages(DATASET).unwrap();
    let edges = runner.storage().count_edges(DATASET).unwrap();

    let second = runner.crawl_dataset(DATASET).await.expect("second crawl");
    assert_eq!(second.fetched, 0);
    assert_eq!(second.skipped, 3);

    assert_eq!(runner.storage().count_pages(DATASET).unwrap(), pages);
    assert_eq!(runner.storage().count_edges(DATASET).unwrap(), edges);
    assert_eq!(pages, 3);
    assert_eq!(edges, 4);
}

#[tokio::test]
async fn test_rerun_retries_failed_page_and_rewrites_edges() {
    let server = MockServer::start().await;
    let db_dir = tempfile::tempdir().expect("temp dir");
    let db_path = db_dir.path().join("crawl.db");
    let db_path = db_path.to_str().expect("utf-8 path");

    mount_page(&server, "N-0.html", r#"<a href="N-1.html">one</a>"#).await;

    // First request for N-1 fails, later ones succeed
    Mock::given(method("GET"))
        .and(path("/~owner/set/N-1.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "N-1.html", r#"<a href="N-2.html">two</a>"#).await;
    mount_page(&server, "N-2.html", "leaf").await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], db_path);
    let one = page_url(&server, "N-1.html");

    {
        let mut runner = Runner::connect(config.clone(), "test-hash").expect("runner");
        let report = runner.crawl_dataset(DATASET).await.expect("first crawl");
        assert_eq!(report.fetched, 1);
        assert_eq!(report.failed, 1);

        let failed = runner.storage().get_page(DATASET, &one).unwrap().unwrap();
        assert_eq!(failed.status, 503);
        assert!(!failed.is_complete());
    }

    // A fresh process over the same database picks the failure up again
    let mut runner = Runner::connect(config, "test-hash").expect("runner");
    let report = runner.crawl_dataset(DATASET).await.expect("second crawl");
    assert_eq!(report.skipped, 1);
    assert_eq!(report.retried, 1);
    assert_eq!(report.fetched, 2);

    let storage = runner.storage();
    let retried = storage.get_page(DATASET, &one).unwrap().unwrap();
    assert_eq!(retried.status, 200);
    assert!(retried.is_complete());
    assert!(retried.error.is_none());

    let edges = storage.get_edges_from(DATASET, &one).unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].to.as_str(), page_url(&server, "N-2.html"));

    assert_eq!(storage.count_pages(DATASET).unwrap(), 3);
    assert_eq!(storage.count_failed_pages(DATASET).unwrap(), 0);
}

#[tokio::test]
async fn test_self_links_produce_no_edges() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "N-0.html",
        r##"<a href="N-0.html">me</a> <a href="#top">top</a> <a href="./N-0.html#x">me again</a>"##,
    )
    .await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 1);
    assert_eq!(report.edges_written, 0);

    let seed = seed_of(&server);
    let page = runner.storage().get_page(DATASET, &seed).unwrap().unwrap();
    assert!(page.out_links.is_empty());
    assert_eq!(runner.storage().count_edges(DATASET).unwrap(), 0);
}

#[tokio::test]
async fn test_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/~owner/set/N-0.html"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/~owner/set/moved/N-0.html", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "moved/N-0.html", r#"<a href="N-1.html">one</a>"#).await;
    mount_page(&server, "moved/N-1.html", "leaf").await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 2);

    let seed = seed_of(&server);
    let page = runner.storage().get_page(DATASET, &seed).unwrap().unwrap();
    assert_eq!(page.out_links.len(), 1);
    assert_eq!(page.out_links[0].as_str(), page_url(&server, "moved/N-1.html"));
}

#[tokio::test]
async fn test_boundary_stops_at_owner_subtree() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "N-0.html",
        r#"<a href="../other/N-5.html">sibling</a> <a href="/~someone/N-0.html">other owner</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/~owner/other/N-5.html"))
        .respond_with(html("sibling leaf"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/~someone/N-0.html"))
        .respond_with(html("never fetched"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 2);

    let outside = format!("{}/~someone/N-0.html", server.uri());
    assert!(runner.storage().get_page(DATASET, &outside).unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_dataset_fails_without_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    let mut runner = in_memory_runner(config);

    let result = runner.run(&Target::parse("vegetables")).await;
    match result {
        Err(CrawlError::UnknownDataset(name)) => assert_eq!(name, "vegetables"),
        other => panic!("expected UnknownDataset, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_all_runs_each_dataset_in_turn() {
    let server = MockServer::start().await;

    for set in ["alpha", "beta"] {
        Mock::given(method("GET"))
            .and(path(format!("/~owner/{}/N-0.html", set)))
            .respond_with(html(r#"<a href="N-1.html">one</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/~owner/{}/N-1.html", set)))
            .respond_with(html("leaf"))
            .mount(&server)
            .await;
    }

    let datasets = vec![
        DatasetEntry::new("alpha", &format!("{}/~owner/alpha/N-0.html", server.uri())),
        DatasetEntry::new("beta", &format!("{}/~owner/beta/N-0.html", server.uri())),
    ];
    let config = create_test_config(datasets, ":memory:");
    let mut runner = in_memory_runner(config);

    let reports = runner.run(&Target::All).await.expect("crawl all");
    let names: Vec<_> = reports.iter().map(|r| r.dataset.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);

    for name in ["alpha", "beta"] {
        assert_eq!(runner.storage().count_pages(name).unwrap(), 2);
        assert_eq!(runner.storage().count_edges(name).unwrap(), 1);

        let run = runner
            .storage()
            .get_latest_run(name)
            .unwrap()
            .expect("run recorded");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.pages_fetched, 2);
        assert_eq!(run.config_hash, "test-hash");
        assert!(run.finished_at.is_some());
    }
}

#[tokio::test]
async fn test_concurrent_fetches_visit_each_page_once() {
    let server = MockServer::start().await;

    let links: String = (1..=8)
        .map(|i| format!(r#"<a href="N-{}.html">{}</a>"#, i, i))
        .collect();
    Mock::given(method("GET"))
        .and(path("/~owner/set/N-0.html"))
        .respond_with(html(&links))
        .expect(1)
        .mount(&server)
        .await;
    for i in 1..=8 {
        Mock::given(method("GET"))
            .and(path(format!("/~owner/set/N-{}.html", i)))
            .respond_with(html(&links).set_delay(Duration::from_millis(50)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config =
        create_test_config(vec![DatasetEntry::new(DATASET, &seed_of(&server))], ":memory:");
    config.crawler.max_concurrent_fetches = 4;
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 9);
    assert_eq!(runner.storage().count_pages(DATASET).unwrap(), 9);

    // Every page links to N-1..N-8, minus itself
    assert_eq!(runner.storage().count_edges(DATASET).unwrap(), 8 + 8 * 7);
}

#[tokio::test]
async fn test_seed_directly_under_origin_crawls_whole_host() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/N-0.html"))
        .respond_with(html(r#"<a href="N-1.html">one</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/N-1.html"))
        .respond_with(html("leaf"))
        .mount(&server)
        .await;

    let seed = format!("{}/N-0.html", server.uri());
    let mut config = create_test_config(vec![DatasetEntry::new(DATASET, &seed)], ":memory:");
    config.boundary.owner_segment = None;
    let mut runner = in_memory_runner(config);

    let report = runner.crawl_dataset(DATASET).await.expect("crawl");
    assert_eq!(report.fetched, 2);
    assert_eq!(runner.storage().count_edges(DATASET).unwrap(), 1);
}
