//! # Share Scraper
//!
//! Discovers publicly indexed share pages for chat-assistant products
//! (ChatGPT, Claude, Grok), extracts the conversation text from each page,
//! and appends it to a flat, append-only text store.
//!
//! ## Usage
//!
//! ```sh
//! share_scraper --source all --mode number --count 100 --parallel 10
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture, run once per source:
//! 1. **Discovery**: Fetch the source's index listing and deduplicate share URLs
//! 2. **Selection**: Narrow the list to all URLs, a range, or the first N
//! 3. **Scraping**: Render and extract pages in batches of `2 × parallel`,
//!    with at most `parallel` pages in flight
//! 4. **Output**: Append each batch's successes to the store before the next batch starts

use clap::Parser;
use reqwest::{Client, Proxy};
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use share_scraper::cli::Cli;
use share_scraper::pipeline::{log_summaries, scrape_sources};
use share_scraper::politeness::RandomPoliteness;
use share_scraper::render::http::HttpRenderer;
use share_scraper::scheduler::{BatchScheduler, SchedulerSettings};
use share_scraper::selection::SelectionPolicy;
use share_scraper::sink::ResultSink;
use share_scraper::sources::SourceRegistry;
use share_scraper::utils::{default_output_path, ensure_writable_parent};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("share_scraper starting up");

    let args = Cli::parse();
    tracing::debug!(?args, "Parsed CLI arguments");

    // ---- Sources ----
    let registry = match &args.config {
        Some(path) => SourceRegistry::from_path(path)?,
        None => SourceRegistry::builtin(),
    };
    let selected = registry.select(&args.source)?;
    let names: Vec<_> = selected.iter().map(|s| s.name.as_str()).collect();
    info!(sources = ?names, "Selected sources");

    let policy = args.selection_policy().unwrap_or_else(|e| {
        warn!(error = %e, "Invalid URL selection; using all URLs");
        SelectionPolicy::All
    });

    // ---- Output ----
    let output_path = args.output.clone().unwrap_or_else(default_output_path);
    if let Err(e) = ensure_writable_parent(&output_path).await {
        error!(
            path = %output_path.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }
    let mut sink = ResultSink::create(&output_path).await?;

    // ---- Clients ----
    let timeout = Duration::from_secs(args.timeout_secs);
    let mut index_client = Client::builder().timeout(timeout);
    if let Some(proxy) = &args.proxy {
        index_client = index_client.proxy(Proxy::all(proxy)?);
    }
    let index_client = index_client.build()?;

    let renderer = HttpRenderer::new(args.proxy.as_deref())?;
    let scheduler = BatchScheduler::new(
        renderer,
        RandomPoliteness::default(),
        SchedulerSettings {
            concurrency: usize::from(args.parallel),
            navigation_timeout: timeout,
            selector_timeout: timeout,
        },
    );

    // ---- Scrape each source independently ----
    let report = scrape_sources(&index_client, selected, &policy, &scheduler, &mut sink).await;
    log_summaries(&report.summaries);
    if let Some(e) = report.error {
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        records = sink.records_written(),
        batches = sink.batches_flushed(),
        path = %sink.path().display(),
        "Scraping complete"
    );

    Ok(())
}
