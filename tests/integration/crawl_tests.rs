//! Integration tests for the crawler
//!
//! These tests drive the full crawl cycle end-to-end, either against wiremock
//! servers through the real HTTP fetcher or through a scripted in-memory
//! fetcher when timing or ordering has to be observed precisely.

use meta_crawl::config::{CrawlerConfig, UserAgentConfig};
use meta_crawl::crawler::{CrawlEngine, FetchOutcome, HttpFetcher, PageFetcher};
use meta_crawl::output::ResultSink;
use meta_crawl::state::EngineState;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_fetcher() -> HttpFetcher {
    HttpFetcher::from_config(&CrawlerConfig::default(), &UserAgentConfig::default())
        .expect("Failed to build HTTP client")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Reads the output file back as (header, rows)
fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open output");
    let header = reader
        .headers()
        .expect("Missing header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("Bad row").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}

/// In-memory fetcher that serves canned pages and records every request
#[derive(Clone, Default)]
struct ScriptedFetcher {
    pages: HashMap<String, String>,
    log: Arc<Mutex<Vec<(String, Instant)>>>,
    /// Cancel this token once this many fetches have been served
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedFetcher {
    fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
    }

    fn start_times(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> FetchOutcome {
        let served = {
            let mut log = self.log.lock().unwrap();
            log.push((url.to_string(), Instant::now()));
            log.len()
        };

        if let Some((limit, token)) = &self.cancel_after {
            if served >= *limit {
                token.cancel();
            }
        }

        match self.pages.get(url.as_str()) {
            Some(body) => FetchOutcome::Success {
                final_url: url.to_string(),
                html: body.clone(),
            },
            None => FetchOutcome::HttpError { status: 404 },
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Site of `n` pages in a chain: / -> /p1 -> ... -> /p{n-1}, the last page links nowhere
fn chain_site(n: usize) -> ScriptedFetcher {
    let next = |i: usize| {
        if i + 1 < n {
            format!(r#"<a href="/p{}">next</a>"#, i + 1)
        } else {
            String::new()
        }
    };

    let mut fetcher = ScriptedFetcher::default()
        .page("https://example.com/", &format!("<title>Home</title>{}", next(0)));
    for i in 1..n {
        fetcher = fetcher.page(
            &format!("https://example.com/p{}", i),
            &format!("<title>Page {}</title>{}", i, next(i)),
        );
    }
    fetcher
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<html><head><title>Home</title>
            <meta name="description" content="The home page"></head>
            <body><a href="/about">About</a> <a href="{}/elsewhere">Other</a></body></html>"#,
            other.uri()
        )))
        .expect(1)
        .mount(&site)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<html><head><title>About</title></head><body><a href="/">Home</a></body></html>"#,
        ))
        .expect(1)
        .mount(&site)
        .await;

    // Same IP, different port: a different site
    Mock::given(method("GET"))
        .respond_with(html("<title>Other</title>"))
        .expect(0)
        .mount(&other)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("site.csv");
    let sink = ResultSink::create(&output).unwrap();

    let mut engine = CrawlEngine::new(&site.uri(), http_fetcher(), Duration::ZERO, sink)
        .expect("Failed to create engine");
    let stats = engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(stats.final_state, EngineState::Completed);
    assert_eq!(stats.pages_recorded, 2);

    let (header, rows) = read_csv(&output);
    assert_eq!(header, vec!["url", "title", "description"]);
    assert_eq!(
        rows,
        vec![
            vec![
                format!("{}/", site.uri()),
                "Home".to_string(),
                "The home page".to_string()
            ],
            vec![format!("{}/about", site.uri()), "About".to_string(), String::new()],
        ]
    );
}

#[tokio::test]
async fn test_each_page_fetched_once() {
    let site = MockServer::start().await;

    // Every page links to every other page, with variants that normalize alike
    let body = r#"<a href="/">home</a> <a href="/a">a</a> <a href="/a#top">a again</a>
                  <a href="/b?utm_source=nav">b</a> <a href="/b">b again</a>"#;
    for p in ["/", "/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(html(body))
            .expect(1)
            .mount(&site)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        &site.uri(),
        http_fetcher(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    let (_, rows) = read_csv(&output);
    let urls: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", site.uri()),
            format!("{}/a", site.uri()),
            format!("{}/b", site.uri()),
        ]
    );
}

#[tokio::test]
async fn test_failed_pages_skipped_and_crawl_continues() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/missing">1</a> <a href="/broken">2</a> <a href="/feed">3</a> <a href="/ok">4</a>"#,
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<title>Still here</title>"))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        &site.uri(),
        http_fetcher(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    let stats = engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(stats.fetch_attempts, 5);
    assert_eq!(stats.http_errors, 2);
    assert_eq!(stats.not_html, 1);
    assert_eq!(stats.final_state, EngineState::Completed);

    let (_, rows) = read_csv(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "Still here");
}

#[tokio::test]
async fn test_redirect_records_final_url_once() {
    let site = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/old">old</a> <a href="/new">new</a>"#))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", site.uri()).as_str()),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<title>New home</title>"))
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        &site.uri(),
        http_fetcher(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    let (_, rows) = read_csv(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], format!("{}/new", site.uri()));
    assert_eq!(rows[1][1], "New home");
}

#[tokio::test]
async fn test_unreachable_seed_writes_header_only() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        &site.uri(),
        http_fetcher(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    let stats = engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(stats.final_state, EngineState::Completed);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "url,title,description\n"
    );
}

#[tokio::test]
async fn test_fields_with_delimiters_are_quoted() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<title>Tea, Coffee &amp; "More"</title>
            <meta name="description" content="line one
line two">"#,
        ))
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        &site.uri(),
        http_fetcher(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.contains(r#""Tea, Coffee & ""More""""#));

    let (_, rows) = read_csv(&output);
    assert_eq!(rows[0][1], r#"Tea, Coffee & "More""#);
    assert_eq!(rows[0][2], "line one\nline two");
}

#[tokio::test]
async fn test_breadth_first_order() {
    // Depth 1: /a /b, depth 2: /a1 (from /a), /b1 (from /b)
    let fetcher = ScriptedFetcher::default()
        .page("https://example.com/", r#"<a href="/a">a</a><a href="/b">b</a>"#)
        .page("https://example.com/a", r#"<a href="/a1">a1</a>"#)
        .page("https://example.com/b", r#"<a href="/b1">b1</a>"#)
        .page("https://example.com/a1", "")
        .page("https://example.com/b1", "");

    let dir = TempDir::new().unwrap();
    let mut engine = CrawlEngine::new(
        "https://example.com/",
        fetcher.clone(),
        Duration::ZERO,
        ResultSink::create(dir.path().join("out.csv")).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(
        fetcher.requested(),
        vec![
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/a1",
            "https://example.com/b1",
        ]
    );
}

#[tokio::test]
async fn test_fetch_starts_are_spaced_by_delay() {
    let delay = Duration::from_millis(50);
    let fetcher = chain_site(4);

    let dir = TempDir::new().unwrap();
    let mut engine = CrawlEngine::new(
        "https://example.com/",
        fetcher.clone(),
        delay,
        ResultSink::create(dir.path().join("out.csv")).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(
        fetcher.requested(),
        vec![
            "https://example.com/",
            "https://example.com/p1",
            "https://example.com/p2",
            "https://example.com/p3"
        ]
    );
    let starts = fetcher.start_times();
    assert_eq!(starts.len(), 4);
    for pair in starts.windows(2) {
        assert!(
            pair[1] - pair[0] >= delay,
            "fetches started {:?} apart",
            pair[1] - pair[0]
        );
    }
}

#[tokio::test]
async fn test_interrupt_saves_partial_results() {
    let cancel = CancellationToken::new();
    let mut fetcher = chain_site(10);
    fetcher.cancel_after = Some((3, cancel.clone()));

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        "https://example.com/",
        fetcher.clone(),
        Duration::ZERO,
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();
    let stats = engine.run(cancel).await.unwrap();

    assert_eq!(stats.final_state, EngineState::Interrupted);
    assert_eq!(engine.state(), EngineState::Interrupted);
    assert_eq!(fetcher.requested().len(), 3);
    assert_eq!(stats.frontier_remaining, 1);

    let (header, rows) = read_csv(&output);
    assert_eq!(header, vec!["url", "title", "description"]);
    let titles: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);
}

#[tokio::test]
async fn test_interrupt_during_rate_limit_wait() {
    let cancel = CancellationToken::new();
    let fetcher = chain_site(3);

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.csv");
    let mut engine = CrawlEngine::new(
        "https://example.com/",
        fetcher.clone(),
        Duration::from_secs(60),
        ResultSink::create(&output).unwrap(),
    )
    .unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let stats = engine.run(cancel).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(stats.final_state, EngineState::Interrupted);
    assert_eq!(fetcher.requested().len(), 1);

    let (_, rows) = read_csv(&output);
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_out_of_scope_links_never_fetched() {
    let fetcher = ScriptedFetcher::default().page(
        "https://example.com/",
        r#"<a href="https://other.com/">other</a>
           <a href="https://sub.example.com/">sub</a>
           <a href="ftp://example.com/files">scheme</a>
           <a href="https://example.com:8443/port">port</a>
           <a href="mailto:team@example.com">mail</a>
           <a href="/logo.png">image</a>
           <a href="/inside">inside</a>"#,
    );

    let dir = TempDir::new().unwrap();
    let mut engine = CrawlEngine::new(
        "https://example.com/",
        fetcher.clone(),
        Duration::ZERO,
        ResultSink::create(dir.path().join("out.csv")).unwrap(),
    )
    .unwrap();
    engine.run(CancellationToken::new()).await.unwrap();

    assert_eq!(
        fetcher.requested(),
        vec!["https://example.com/", "https://example.com/inside"]
    );
}
