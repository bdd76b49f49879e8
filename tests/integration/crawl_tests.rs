//! Integration tests for the crawler
//!
//! These tests drive the full crawl cycle end-to-end, either against
//! wiremock servers or against an in-memory link graph.

use async_trait::async_trait;
use polite_crawler::config::Config;
use polite_crawler::crawler::{Coordinator, Downloader, FetchError, FinishReason};
use polite_crawler::output::{CrawlRecord, MemorySink, OutputError, OutputResult, RecordSink};
use polite_crawler::{CrawlerError, OutputFormat};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory site: URL -> HTML body. Unknown URLs fail with 404.
#[derive(Default)]
struct GraphDownloader {
    pages: HashMap<String, String>,
    delay: Duration,
    fetches: Mutex<HashMap<String, usize>>,
}

impl GraphDownloader {
    fn new() -> Self {
        Self::default()
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Adds a page whose body links to each of `links`
    fn page(mut self, url: &str, links: &[&str]) -> Self {
        let anchors: String = links
            .iter()
            .map(|link| format!(r#"<a href="{}">link</a>"#, link))
            .collect();
        let body = format!(
            "<html><head><title>{}</title></head><body><p>About {}</p>{}</body></html>",
            url, url, anchors
        );
        self.pages.insert(url.to_string(), body);
        self
    }

    fn raw(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn fetched(&self) -> HashSet<String> {
        self.fetches.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Downloader for GraphDownloader {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Sink whose writes always fail
#[derive(Default)]
struct BrokenSink {
    closes: AtomicUsize,
}

impl RecordSink for BrokenSink {
    fn write_record(&self, _record: &CrawlRecord) -> OutputResult<()> {
        Err(OutputError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }

    fn close(&self) -> OutputResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Creates a test configuration for the given seed
fn create_test_config(seed: &str, workers: usize, max_pages: usize) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = seed.to_string();
    config.crawler.workers = workers;
    config.crawler.max_pages = max_pages;
    config.crawler.max_idle_wait_ms = 20;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0".to_string();
    config
}

fn recorded_urls(sink: &MemorySink) -> Vec<String> {
    sink.records().into_iter().map(|r| r.url).collect()
}

fn assert_no_duplicates(urls: &[String]) {
    let unique: HashSet<_> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len(), "duplicate records: {:?}", urls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_cap_scenario() {
    let a = "http://site.test/a";
    let b = "http://site.test/b";
    let c = "http://site.test/c";
    let d = "http://site.test/d";

    let downloader = Arc::new(
        GraphDownloader::new()
            .page(a, &[b, c])
            .page(b, &[a, d])
            .page(c, &[])
            .page(d, &[]),
    );
    let sink = Arc::new(MemorySink::new());

    let coordinator = Coordinator::new(
        create_test_config(a, 4, 3),
        downloader.clone(),
        sink.clone(),
    )
    .unwrap();
    let frontier = Arc::clone(coordinator.frontier());

    let summary = coordinator.run().await.unwrap();

    let mut visited = frontier.visited_urls();
    visited.sort();
    assert_eq!(visited, vec![a, b, c]);

    let mut urls = recorded_urls(&sink);
    assert_no_duplicates(&urls);
    urls.sort();
    assert_eq!(urls, vec![a, b, c]);

    assert_eq!(downloader.fetch_count(a), 1);
    assert_eq!(downloader.fetch_count(d), 0);
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.pages_recorded, 3);
    assert_eq!(summary.finish_reason, FinishReason::CapReached);
    assert_eq!(frontier.active_workers(), 0);
    assert!(sink.is_closed());
}

#[tokio::test]
async fn test_failing_url_is_visited_but_not_recorded() {
    let a = "http://site.test/a";
    let broken = "http://site.test/broken";

    let downloader = Arc::new(GraphDownloader::new().page(a, &[broken]));
    let sink = Arc::new(MemorySink::new());

    let coordinator =
        Coordinator::new(create_test_config(a, 2, 100), downloader.clone(), sink.clone())
            .unwrap();
    let frontier = Arc::clone(coordinator.frontier());
    let summary = coordinator.run().await.unwrap();

    assert!(frontier.is_visited(broken));
    assert_eq!(recorded_urls(&sink), vec![a]);
    assert_eq!(downloader.fetch_count(broken), 1);
    assert_eq!(summary.fetch_failures, 1);
    assert_eq!(summary.finish_reason, FinishReason::Exhausted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_terminates_on_finite_graph() {
    // Every page links to its two successors and back to the root
    let n = 60;
    let urls: Vec<String> = (0..n).map(|i| format!("http://site.test/p{}", i)).collect();
    let mut downloader = GraphDownloader::new().with_delay(Duration::from_millis(2));
    for i in 0..n {
        let links: Vec<&str> = [i + 1, i + 2, 0]
            .iter()
            .filter(|&&j| j < n)
            .map(|&j| urls[j].as_str())
            .collect();
        downloader = downloader.page(&urls[i], &links);
    }
    let downloader = Arc::new(downloader);
    let sink = Arc::new(MemorySink::new());

    let coordinator = Coordinator::new(
        create_test_config(&urls[0], 8, 1000),
        downloader.clone(),
        sink.clone(),
    )
    .unwrap();
    let frontier = Arc::clone(coordinator.frontier());

    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("crawl did not terminate")
        .unwrap();

    let recorded = recorded_urls(&sink);
    assert_no_duplicates(&recorded);
    assert_eq!(recorded.len(), n);
    assert_eq!(summary.pages_visited, n);
    assert_eq!(summary.finish_reason, FinishReason::Exhausted);
    assert_eq!(frontier.active_workers(), 0);
    assert_eq!(frontier.snapshot().queued, 0);

    for url in &urls {
        assert_eq!(downloader.fetch_count(url), 1, "{} fetched more than once", url);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_robots_fetch_per_host() {
    let root = "http://site.test/";
    let children: Vec<String> = (0..30).map(|i| format!("http://site.test/c{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();

    let mut downloader = GraphDownloader::new()
        .with_delay(Duration::from_millis(5))
        .page(root, &child_refs)
        .raw("http://site.test/robots.txt", "User-agent: *\nDisallow: /nowhere/\n");
    for child in &children {
        downloader = downloader.page(child, &[]);
    }
    let downloader = Arc::new(downloader);
    let sink = Arc::new(MemorySink::new());

    let coordinator =
        Coordinator::new(create_test_config(root, 16, 100), downloader.clone(), sink.clone())
            .unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(downloader.fetch_count("http://site.test/robots.txt"), 1);
    assert_eq!(summary.pages_recorded, 31);
    assert_eq!(summary.robots_hosts, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_robots_enforced_under_concurrency() {
    let root = "http://site.test/";
    let private: Vec<String> = (0..20)
        .map(|i| format!("http://site.test/private/{}", i))
        .collect();
    let public: Vec<String> = (0..20)
        .map(|i| format!("http://site.test/public/{}", i))
        .collect();
    let links: Vec<&str> = private
        .iter()
        .chain(public.iter())
        .map(String::as_str)
        .collect();

    let mut downloader = GraphDownloader::new()
        .with_delay(Duration::from_millis(2))
        .page(root, &links)
        .raw("http://site.test/robots.txt", "User-agent: *\nDisallow: /private/\n");
    for url in private.iter().chain(public.iter()) {
        downloader = downloader.page(url, &[]);
    }
    let downloader = Arc::new(downloader);
    let sink = Arc::new(MemorySink::new());

    let coordinator =
        Coordinator::new(create_test_config(root, 12, 100), downloader.clone(), sink.clone())
            .unwrap();
    let summary = coordinator.run().await.unwrap();

    let fetched = downloader.fetched();
    assert!(fetched.iter().all(|url| !url.contains("/private/")));

    let recorded = recorded_urls(&sink);
    assert!(recorded.iter().all(|url| !url.contains("/private/")));
    assert_eq!(recorded.len(), 21);
    assert_eq!(summary.robots_denied, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_timeout_cancels_in_flight_work() {
    let a = "http://slow.test/a";
    let downloader = Arc::new(
        GraphDownloader::new()
            .with_delay(Duration::from_secs(30))
            .page(a, &[]),
    );
    let sink = Arc::new(MemorySink::new());

    let mut config = create_test_config(a, 2, 10);
    config.crawler.crawl_timeout_secs = Some(1);
    let coordinator = Coordinator::new(config, downloader, sink.clone()).unwrap();
    let frontier = Arc::clone(coordinator.frontier());

    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("cancellation did not stop the crawl")
        .unwrap();

    assert_eq!(summary.finish_reason, FinishReason::Cancelled);
    assert_eq!(frontier.active_workers(), 0);
    assert!(sink.records().is_empty());
    assert!(sink.is_closed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_handle_stops_crawl() {
    let a = "http://slow.test/a";
    let downloader = Arc::new(
        GraphDownloader::new()
            .with_delay(Duration::from_secs(30))
            .page(a, &[]),
    );
    let sink = Arc::new(MemorySink::new());

    let coordinator =
        Coordinator::new(create_test_config(a, 3, 10), downloader, sink.clone()).unwrap();
    let handle = coordinator.shutdown_handle();
    let frontier = Arc::clone(coordinator.frontier());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("shutdown handle did not stop the crawl")
        .unwrap();

    assert_eq!(summary.finish_reason, FinishReason::Cancelled);
    assert_eq!(frontier.active_workers(), 0);
}

#[tokio::test]
async fn test_sink_failure_is_fatal() {
    let a = "http://site.test/a";
    let b = "http://site.test/b";
    let downloader = Arc::new(GraphDownloader::new().page(a, &[b]).page(b, &[]));
    let sink = Arc::new(BrokenSink::default());

    let coordinator =
        Coordinator::new(create_test_config(a, 2, 10), downloader.clone(), sink.clone())
            .unwrap();
    let result = coordinator.run().await;

    assert!(matches!(result, Err(CrawlerError::Output(_))));
    assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    // The failing page's links are never enqueued
    assert_eq!(downloader.fetch_count(b), 0);
}

#[tokio::test]
async fn test_full_crawl_over_http_with_robots() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/\n"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Home</title>
            <meta name="description" content="The home page"></head><body>
            <a href="/private/x">Private</a>
            <a href="/public/y">Public</a>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Secret</title>"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public/y"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><title>Public "Y"</title></head><body><p>Open to all</p></body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let output_path = temp_dir.path().join("results.csv");

    let mut config = create_test_config(&format!("{}/", base_url), 4, 50);
    config.output.path = output_path.to_string_lossy().to_string();
    config.output.format = OutputFormat::Csv;

    let summary = Coordinator::from_config(config)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.pages_recorded, 2);
    assert_eq!(summary.robots_denied, 1);
    assert_eq!(summary.finish_reason, FinishReason::Exhausted);

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/private/x"));
    let robots_requests = requests
        .iter()
        .filter(|r| r.url.path() == "/robots.txt")
        .count();
    assert_eq!(robots_requests, 1);

    let contents = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], r#""URL","Title","Description""#);
    assert_eq!(lines.len(), 3);
    assert!(contents.contains(&format!(
        r#""{}/","Home","The home page""#,
        base_url
    )));
    assert!(contents.contains(&format!(
        r#""{}/public/y","Public ""Y""","Open to all""#,
        base_url
    )));
    assert!(!contents.contains("/private/x"));
}

#[tokio::test]
async fn test_jsonl_output_appends_across_runs() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<title>Only</title><p>Single page</p>"),
        )
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let output_path = temp_dir.path().join("results.jsonl");

    for _ in 0..2 {
        let mut config = create_test_config(&format!("{}/", base_url), 2, 10);
        config.output.path = output_path.to_string_lossy().to_string();
        config.output.format = OutputFormat::JsonLines;
        Coordinator::from_config(config)
            .unwrap()
            .run()
            .await
            .unwrap();
    }

    let contents = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["url"], format!("{}/", base_url));
        assert_eq!(value["title"], "Only");
        assert_eq!(value["description"], "Single page");
    }
}
