//! Data models shared by every stage of the pipeline.
//!
//! - [`Source`]: a chat-assistant provider whose share pages are scraped
//! - [`ExtractionRule`]: the content selector and filtering policy of a source
//! - [`WorkItem`]: one candidate URL bound to its source
//! - [`ScrapeOutcome`]: the resolved result of processing one work item
//! - [`SourceSummary`]: per-source counters reported at the end of a run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Phrases that mark a text fragment as page chrome rather than conversation.
pub const DEFAULT_UNWANTED_PHRASES: &[&str] = &[
    "Log in",
    "Sign up",
    "can make mistakes",
    "Temporary Chat",
    "Skip to content",
    "By messaging",
    "What can I help with",
];

/// Fragments must have strictly more whitespace-delimited tokens than this.
pub const DEFAULT_MIN_WORDS: usize = 5;

fn default_selector() -> String {
    "p".to_string()
}

fn default_min_words() -> usize {
    DEFAULT_MIN_WORDS
}

fn default_unwanted_phrases() -> Vec<String> {
    DEFAULT_UNWANTED_PHRASES.iter().map(|p| p.to_string()).collect()
}

/// How conversation text is picked out of a rendered share page.
///
/// Rules are plain data: swapping a selector or the denylist never touches
/// pipeline code. Fields omitted from a registry file take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractionRule {
    /// CSS selector for the nodes holding message text.
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Case-insensitive phrases that disqualify a fragment.
    #[serde(default = "default_unwanted_phrases")]
    pub unwanted_phrases: Vec<String>,
    /// A fragment is kept only if its token count is greater than this.
    #[serde(default = "default_min_words")]
    pub min_words: usize,
}

impl ExtractionRule {
    pub fn with_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Self::default()
        }
    }
}

impl Default for ExtractionRule {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            unwanted_phrases: default_unwanted_phrases(),
            min_words: default_min_words(),
        }
    }
}

/// A chat-assistant provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Source {
    /// Short identifier used on the command line (e.g. `chatgpt`).
    pub id: String,
    /// Human-readable name used in logs and summaries.
    pub name: String,
    /// Endpoint returning a newline-delimited list of share URLs.
    pub index_url: String,
    #[serde(default)]
    pub rule: ExtractionRule,
}

/// One share URL queued for fetch and extraction.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub url: String,
    pub source: Arc<Source>,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, source: Arc<Source>) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }
}

/// Result of processing a single [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    /// Cleaned conversation text.
    Success(String),
    /// The page loaded but nothing passed the content criteria.
    Empty,
    /// The renderer faulted (timeout, crash, bad status).
    Failed(String),
}

impl ScrapeOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ScrapeOutcome::Success(text) => Some(text),
            _ => None,
        }
    }
}

/// Running counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub attempted: usize,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
}

impl RunCounts {
    pub fn record(&mut self, outcome: &ScrapeOutcome) {
        self.attempted += 1;
        match outcome {
            ScrapeOutcome::Success(_) => self.succeeded += 1,
            ScrapeOutcome::Empty => self.empty += 1,
            ScrapeOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// What happened to a source over the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Completed,
    NoUrls,
    DiscoveryFailed(String),
}

/// Final per-source report.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub source: String,
    pub discovered: usize,
    pub selected: usize,
    pub counts: RunCounts,
    pub status: SourceStatus,
}

impl fmt::Display for SourceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SourceStatus::Completed => write!(
                f,
                "{}: {}/{} URLs scraped successfully ({} empty, {} failed; {} of {} discovered selected)",
                self.source,
                self.counts.succeeded,
                self.counts.attempted,
                self.counts.empty,
                self.counts.failed,
                self.selected,
                self.discovered
            ),
            SourceStatus::NoUrls => write!(f, "{}: no URLs found", self.source),
            SourceStatus::DiscoveryFailed(reason) => {
                write!(f, "{}: discovery failed ({reason})", self.source)
            }
        }
    }
}
