//! Per-source pipeline: discover → select → schedule → flush.
//!
//! Each source is processed independently. A discovery failure or an empty
//! index is reported in that source's summary and the caller moves on to the
//! next source; only a sink failure is returned as an error.

use crate::discovery::discover;
use crate::errors::SinkError;
use crate::models::{RunCounts, Source, SourceStatus, SourceSummary, WorkItem};
use crate::politeness::Politeness;
use crate::render::Renderer;
use crate::scheduler::BatchScheduler;
use crate::selection::{SelectionPolicy, select};
use crate::sink::BatchSink;
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Run one source end to end.
///
/// # Arguments
///
/// * `client` - HTTP client for the index request
/// * `source` - The provider to discover and scrape
/// * `policy` - How the discovered URLs are narrowed
/// * `scheduler` - Shared renderer, politeness policy and concurrency limit
/// * `sink` - Output store, appended to once per batch
///
/// # Returns
///
/// The source's summary. Discovery failures and empty indexes are reported
/// through [`SourceSummary::status`] rather than as errors.
///
/// # Errors
///
/// Returns [`SinkError`] if a batch cannot be written.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn scrape_source<R, P, S>(
    client: &Client,
    source: Arc<Source>,
    policy: &SelectionPolicy,
    scheduler: &BatchScheduler<R, P>,
    sink: &mut S,
) -> Result<SourceSummary, SinkError>
where
    R: Renderer,
    P: Politeness,
    S: BatchSink,
{
    let mut summary = SourceSummary {
        source: source.name.clone(),
        discovered: 0,
        selected: 0,
        counts: RunCounts::default(),
        status: SourceStatus::Completed,
    };

    info!("Fetching share URLs");
    let user_agent = scheduler.politeness().user_agent();
    let urls = match discover(client, &source, &user_agent).await {
        Ok(urls) => urls,
        Err(e) => {
            error!(error = %e, "Error fetching URLs; skipping source");
            summary.status = SourceStatus::DiscoveryFailed(e.to_string());
            return Ok(summary);
        }
    };

    summary.discovered = urls.len();
    if urls.is_empty() {
        warn!("No URLs found");
        summary.status = SourceStatus::NoUrls;
        return Ok(summary);
    }
    info!(count = urls.len(), "Found URLs");

    let items: Vec<WorkItem> = select(&urls, policy)
        .into_iter()
        .map(|url| WorkItem::new(url, Arc::clone(&source)))
        .collect();
    summary.selected = items.len();
    info!(
        selected = items.len(),
        batch_size = scheduler.batch_size(),
        "Scraping selected URLs"
    );

    summary.counts = scheduler.run(items, sink).await?;
    info!("{summary}");
    Ok(summary)
}

/// Outcome of a multi-source run.
#[derive(Debug)]
pub struct RunReport {
    /// Summaries of every source that ran to completion, in source order.
    pub summaries: Vec<SourceSummary>,
    /// The sink failure that stopped the run, if any.
    pub error: Option<SinkError>,
}

/// Run each source in turn, stopping at the first sink failure.
///
/// Summaries of the sources finished before a failure are kept in the
/// report so they can still be logged.
pub async fn scrape_sources<R, P, S>(
    client: &Client,
    sources: Vec<Arc<Source>>,
    policy: &SelectionPolicy,
    scheduler: &BatchScheduler<R, P>,
    sink: &mut S,
) -> RunReport
where
    R: Renderer,
    P: Politeness,
    S: BatchSink,
{
    let mut summaries = Vec::with_capacity(sources.len());
    for source in sources {
        match scrape_source(client, source, policy, scheduler, sink).await {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                error!(error = %e, "Writing results failed; stopping run");
                return RunReport {
                    summaries,
                    error: Some(e),
                };
            }
        }
    }
    RunReport {
        summaries,
        error: None,
    }
}

/// Log one line per source, warning for sources that did not complete.
pub fn log_summaries(summaries: &[SourceSummary]) {
    for summary in summaries {
        match summary.status {
            SourceStatus::Completed => info!("{summary}"),
            _ => warn!("{summary}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionRule, ScrapeOutcome};
    use crate::politeness::FixedPoliteness;
    use crate::scheduler::SchedulerSettings;
    use crate::scheduler::tests::{FakeRenderer, RecordingSink, Script};
    use crate::sink::{ResultSink, parse_records};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn demo(index_url: String) -> Arc<Source> {
        Arc::new(Source {
            id: "demo".into(),
            name: "Demo".into(),
            index_url,
            rule: ExtractionRule::default(),
        })
    }

    async fn index_server(status: u16, body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn scheduler(renderer: FakeRenderer) -> BatchScheduler<FakeRenderer, FixedPoliteness> {
        BatchScheduler::new(
            renderer,
            FixedPoliteness::new(Duration::ZERO),
            SchedulerSettings::default(),
        )
    }

    #[tokio::test]
    async fn end_to_end_demo_source() {
        let server = index_server(200, "https://x/1\nhttps://x/1\nhttps://x/2").await;
        let renderer = FakeRenderer::new(vec![
            (
                "https://x/1".to_string(),
                Script::Texts(vec!["hello world this is fine message"]),
            ),
            ("https://x/2".to_string(), Script::Texts(vec![])),
        ]);
        let scheduler = scheduler(renderer);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("scraped_content.txt");
        let mut sink = ResultSink::create(&out).await.unwrap();

        let summary = scrape_source(
            &Client::new(),
            demo(format!("{}/index", server.uri())),
            &SelectionPolicy::All,
            &scheduler,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(summary.status, SourceStatus::Completed);
        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.selected, 2);
        assert_eq!(summary.counts.attempted, 2);
        assert_eq!(summary.counts.succeeded, 1);

        let store = tokio::fs::read_to_string(&out).await.unwrap();
        assert_eq!(
            parse_records(&store),
            vec![(
                "https://x/1".to_string(),
                "hello world this is fine message".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn discovery_failure_skips_only_that_source() {
        let server = index_server(500, "").await;
        let scheduler = scheduler(FakeRenderer::new(vec![]));
        let mut sink = RecordingSink::default();

        let summary = scrape_source(
            &Client::new(),
            demo(format!("{}/index", server.uri())),
            &SelectionPolicy::All,
            &scheduler,
            &mut sink,
        )
        .await
        .unwrap();

        assert!(matches!(summary.status, SourceStatus::DiscoveryFailed(_)));
        assert_eq!(summary.counts.attempted, 0);
        assert!(sink.batches.is_empty());
    }

    #[tokio::test]
    async fn empty_index_is_reported_not_scraped() {
        let server = index_server(200, "\n\n").await;
        let scheduler = scheduler(FakeRenderer::new(vec![]));
        let mut sink = RecordingSink::default();

        let summary = scrape_source(
            &Client::new(),
            demo(format!("{}/index", server.uri())),
            &SelectionPolicy::All,
            &scheduler,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(summary.status, SourceStatus::NoUrls);
        assert!(sink.batches.is_empty());
    }

    #[tokio::test]
    async fn sink_failure_keeps_summaries_of_finished_sources() {
        let server = index_server(200, "https://x/1").await;
        let scheduler = scheduler(FakeRenderer::new(vec![(
            "https://x/1".to_string(),
            Script::Texts(vec!["hello world this is fine message"]),
        )]));
        let mut sink = RecordingSink {
            fail_after: Some(1),
            ..Default::default()
        };
        let index_url = format!("{}/index", server.uri());

        let report = scrape_sources(
            &Client::new(),
            vec![demo(index_url.clone()), demo(index_url.clone()), demo(index_url)],
            &SelectionPolicy::All,
            &scheduler,
            &mut sink,
        )
        .await;

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].counts.succeeded, 1);
        assert!(matches!(report.error, Some(SinkError::Io { .. })));
        assert_eq!(sink.batches.len(), 1);
    }

    #[tokio::test]
    async fn every_source_reports_when_nothing_fails() {
        let ok = index_server(200, "https://x/1").await;
        let broken = index_server(503, "").await;
        let scheduler = scheduler(FakeRenderer::new(vec![]));
        let mut sink = RecordingSink::default();

        let report = scrape_sources(
            &Client::new(),
            vec![
                demo(format!("{}/index", broken.uri())),
                demo(format!("{}/index", ok.uri())),
            ],
            &SelectionPolicy::All,
            &scheduler,
            &mut sink,
        )
        .await;

        assert!(report.error.is_none());
        assert!(matches!(report.summaries[0].status, SourceStatus::DiscoveryFailed(_)));
        assert_eq!(report.summaries[1].status, SourceStatus::Completed);
        log_summaries(&report.summaries);
    }

    #[tokio::test]
    async fn selection_narrows_the_work_list() {
        let listing = (1..=6).map(|i| format!("https://x/{i}")).collect::<Vec<_>>().join("\n");
        let server = index_server(200, &listing).await;
        let scheduler = scheduler(FakeRenderer::new(vec![]));
        let mut sink = RecordingSink::default();

        let summary = scrape_source(
            &Client::new(),
            demo(format!("{}/index", server.uri())),
            &SelectionPolicy::Range { start: 2, end: 3 },
            &scheduler,
            &mut sink,
        )
        .await
        .unwrap();

        assert_eq!(summary.discovered, 6);
        assert_eq!(summary.selected, 2);
        let urls: Vec<_> = sink.batches.concat().into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, vec!["https://x/2", "https://x/3"]);
        assert!(
            sink.batches
                .concat()
                .iter()
                .all(|(_, o)| *o == ScrapeOutcome::Empty)
        );
    }
}
