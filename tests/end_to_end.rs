use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use share_scraper::models::{ExtractionRule, Source, SourceStatus};
use share_scraper::pipeline::scrape_source;
use share_scraper::politeness::FixedPoliteness;
use share_scraper::render::http::HttpRenderer;
use share_scraper::scheduler::{BatchScheduler, SchedulerSettings};
use share_scraper::selection::SelectionPolicy;
use share_scraper::sink::{ResultSink, parse_records};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, status: u16, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

fn source(server: &MockServer, selector: &str) -> Arc<Source> {
    Arc::new(Source {
        id: "demo".into(),
        name: "Demo".into(),
        index_url: format!("{}/index", server.uri()),
        rule: ExtractionRule::with_selector(selector),
    })
}

fn scheduler(concurrency: usize) -> BatchScheduler<HttpRenderer, FixedPoliteness> {
    BatchScheduler::new(
        HttpRenderer::new(None).expect("client builds"),
        FixedPoliteness::new(Duration::ZERO),
        SchedulerSettings {
            concurrency,
            navigation_timeout: Duration::from_secs(5),
            selector_timeout: Duration::from_secs(5),
        },
    )
}

#[tokio::test]
async fn demo_source_writes_one_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = format!("{base}/share/1\n{base}/share/1\n{base}/share/2\n");
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/share/1",
        200,
        "<html><body><p>hello world this is fine message</p><p>Log in to keep chatting with us</p></body></html>",
    )
    .await;
    mount_html(&server, "/share/2", 200, "<html><body><div>nothing here</div></body></html>").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("scraped_content.txt");
    let mut sink = ResultSink::create(&out).await.unwrap();

    let summary = scrape_source(
        &Client::new(),
        source(&server, "p"),
        &SelectionPolicy::All,
        &scheduler(10),
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(summary.status, SourceStatus::Completed);
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.counts.attempted, 2);
    assert_eq!(summary.counts.succeeded, 1);
    assert_eq!(summary.counts.empty, 1);

    let store = tokio::fs::read_to_string(&out).await.unwrap();
    assert_eq!(
        parse_records(&store),
        vec![(
            format!("{base}/share/1"),
            "hello world this is fine message".to_string()
        )]
    );
}

#[tokio::test]
async fn failed_pages_do_not_block_their_batch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = (1..=5)
        .map(|i| format!("{base}/share/{i}"))
        .collect::<Vec<_>>()
        .join("\n");
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    for i in [1, 2, 4, 5] {
        let html = format!(
            r#"<div class="prose"><p>message number {i} has enough words in it</p></div>"#
        );
        mount_html(&server, &format!("/share/{i}"), 200, &html).await;
    }
    mount_html(&server, "/share/3", 502, "bad gateway").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut sink = ResultSink::create(&out).await.unwrap();

    let summary = scrape_source(
        &Client::new(),
        source(&server, "div.prose p"),
        &SelectionPolicy::All,
        &scheduler(2),
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(summary.counts.attempted, 5);
    assert_eq!(summary.counts.succeeded, 4);
    assert_eq!(summary.counts.failed, 1);
    assert_eq!(sink.batches_flushed(), 2);

    let store = tokio::fs::read_to_string(&out).await.unwrap();
    let urls: Vec<_> = parse_records(&store).into_iter().map(|(u, _)| u).collect();
    let expected: Vec<_> = [1, 2, 4, 5].iter().map(|i| format!("{base}/share/{i}")).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn count_selection_limits_the_pages_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let listing = (1..=4)
        .map(|i| format!("{base}/share/{i}"))
        .collect::<Vec<_>>()
        .join("\n");
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/share/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>the only page that should be fetched</p>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut sink = ResultSink::create(dir.path().join("out.txt")).await.unwrap();

    let summary = scrape_source(
        &Client::new(),
        source(&server, "p"),
        &SelectionPolicy::Count(1),
        &scheduler(10),
        &mut sink,
    )
    .await
    .unwrap();

    assert_eq!(summary.selected, 1);
    assert_eq!(summary.counts.succeeded, 1);
    assert_eq!(sink.records_written(), 1);
}
