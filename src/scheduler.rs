//! Bounded-concurrency batch scheduler.
//!
//! Work items are cut into consecutive batches of `2 × concurrency`. Every
//! item of a batch is started at once and competes for one of `concurrency`
//! permits; the batch is joined, handed to the [`BatchSink`], and only then is
//! the next batch started. At most one batch of outcomes is ever held in
//! memory and the output store grows batch by batch.
//!
//! # Per-item lifecycle
//!
//! ```text
//! acquire permit ─► open page ─► extract ─► close page ─► cooldown ─► release permit
//! ```
//!
//! Navigation and selector waits are bounded by timeouts. Every renderer
//! fault becomes [`ScrapeOutcome::Failed`] for that item alone; siblings in
//! the batch carry on. Only a sink failure stops the run.

use crate::errors::{RenderError, SinkError};
use crate::extractor::extract;
use crate::models::{RunCounts, ScrapeOutcome, WorkItem};
use crate::politeness::Politeness;
use crate::render::{PageHandle, Renderer};
use crate::sink::BatchSink;
use crate::utils::truncate_for_log;
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Maximum number of pages in flight at once.
    pub concurrency: usize,
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            navigation_timeout: DEFAULT_TIMEOUT,
            selector_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Drives the renderer and extractor over a sequence of work items.
pub struct BatchScheduler<R, P> {
    renderer: R,
    politeness: P,
    settings: SchedulerSettings,
    limiter: Semaphore,
}

impl<R, P> BatchScheduler<R, P>
where
    R: Renderer,
    P: Politeness,
{
    pub fn new(renderer: R, politeness: P, mut settings: SchedulerSettings) -> Self {
        settings.concurrency = settings.concurrency.max(1);
        let limiter = Semaphore::new(settings.concurrency);
        Self {
            renderer,
            politeness,
            settings,
            limiter,
        }
    }

    pub fn politeness(&self) -> &P {
        &self.politeness
    }

    pub fn batch_size(&self) -> usize {
        self.settings.concurrency * 2
    }

    /// Process `items` batch by batch, flushing each batch to `sink` before
    /// the next one starts.
    ///
    /// # Arguments
    ///
    /// * `items` - Work items in the order they are batched and flushed
    /// * `sink` - Receives each resolved batch, in item order
    ///
    /// # Returns
    ///
    /// Counters over every item attempted, split by outcome kind.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if a flush fails; batches already flushed stay
    /// on disk and no further batches are started.
    #[instrument(level = "info", skip_all, fields(items = items.len(), concurrency = self.settings.concurrency))]
    pub async fn run<S: BatchSink>(
        &self,
        items: Vec<WorkItem>,
        sink: &mut S,
    ) -> Result<RunCounts, SinkError> {
        let total = items.len();
        let batch_size = self.batch_size();
        let batches = total.div_ceil(batch_size);
        let mut counts = RunCounts::default();

        for (index, chunk) in items.chunks(batch_size).enumerate() {
            info!(batch = index + 1, batches, size = chunk.len(), "Processing batch");

            let outcomes = join_all(chunk.iter().map(|item| self.process(item))).await;
            let resolved: Vec<(WorkItem, ScrapeOutcome)> =
                chunk.iter().cloned().zip(outcomes).collect();
            for (_, outcome) in &resolved {
                counts.record(outcome);
            }

            sink.flush(&resolved).await?;
            info!(
                completed = counts.attempted,
                total,
                succeeded = counts.succeeded,
                "Batch flushed"
            );
        }

        Ok(counts)
    }

    /// One work item under one permit. Never fails; faults become outcomes.
    async fn process(&self, item: &WorkItem) -> ScrapeOutcome {
        let permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ScrapeOutcome::Failed(e.to_string()),
        };

        debug!(url = %item.url, source = %item.source.name, "Scraping");
        let outcome = self.fetch(item).await;
        match &outcome {
            ScrapeOutcome::Success(text) => info!(
                url = %item.url,
                bytes = text.len(),
                preview = %truncate_for_log(text, 80),
                "Scraped share page"
            ),
            ScrapeOutcome::Empty => warn!(url = %item.url, "No chat messages found"),
            ScrapeOutcome::Failed(reason) => {
                error!(url = %item.url, error = %reason, "Scrape failed")
            }
        }

        sleep(self.politeness.cooldown()).await;
        drop(permit);
        outcome
    }

    /// Open, extract, and close. The page is closed on every path that
    /// produced one, before the caller releases the permit.
    async fn fetch(&self, item: &WorkItem) -> ScrapeOutcome {
        let user_agent = self.politeness.user_agent();
        let nav_timeout = self.settings.navigation_timeout;

        let opened = timeout(
            nav_timeout,
            self.renderer.open(&item.url, &user_agent, nav_timeout),
        )
        .await;
        let page = match opened {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return ScrapeOutcome::Failed(e.to_string()),
            Err(_) => {
                return ScrapeOutcome::Failed(RenderError::NavigationTimeout(nav_timeout).to_string());
            }
        };

        let outcome = extract(&page, &item.source.rule, self.settings.selector_timeout).await;
        page.close().await;
        outcome
    }
}
