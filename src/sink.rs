//! Append-only output store.
//!
//! Each successful outcome becomes one framed record:
//!
//! ```text
//! --- Start of <url> ---
//! <text>
//! --- End of <url> ---
//!
//! ```
//!
//! The store is truncated once when the sink is created and then only ever
//! appended to, one write per completed batch. Every flush is synced to disk
//! before the scheduler moves on, so a crash loses at most the batch in flight.

use crate::errors::SinkError;
use crate::models::{ScrapeOutcome, WorkItem};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

const START_PREFIX: &str = "--- Start of ";
const MARKER_SUFFIX: &str = " ---\n";

/// Receiver for each completed batch, called in batch order.
pub trait BatchSink {
    /// Persist the successful outcomes of one batch, in work-item order.
    /// Returns how many records were written.
    async fn flush(&mut self, batch: &[(WorkItem, ScrapeOutcome)]) -> Result<usize, SinkError>;
}

/// Frame one `(url, text)` pair.
pub fn format_record(url: &str, text: &str) -> String {
    format!("--- Start of {url} ---\n{text}\n--- End of {url} ---\n\n")
}

/// Split a store back into `(url, text)` pairs in write order.
///
/// Scanning stops at the first record without a matching end marker, which
/// is what a torn final write looks like.
pub fn parse_records(store: &str) -> Vec<(String, String)> {
    let mut records = Vec::new();
    let mut rest = store;

    while let Some(start) = rest.find(START_PREFIX) {
        let header = &rest[start + START_PREFIX.len()..];
        let Some(url_end) = header.find(MARKER_SUFFIX) else {
            break;
        };
        let url = &header[..url_end];
        let body = &header[url_end + MARKER_SUFFIX.len()..];

        let end_marker = format!("\n--- End of {url} ---\n");
        let Some(text_end) = body.find(&end_marker) else {
            break;
        };
        records.push((url.to_string(), body[..text_end].to_string()));
        rest = &body[text_end + end_marker.len()..];
    }
    records
}

/// File-backed [`BatchSink`].
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    file: File,
    records_written: usize,
    batches_flushed: usize,
}

impl ResultSink {
    /// Create or truncate the store at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        Ok(Self {
            path,
            file,
            records_written: 0,
            batches_flushed: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn batches_flushed(&self) -> usize {
        self.batches_flushed
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl BatchSink for ResultSink {
    async fn flush(&mut self, batch: &[(WorkItem, ScrapeOutcome)]) -> Result<usize, SinkError> {
        let mut buffer = String::new();
        let mut written = 0;
        for (item, outcome) in batch {
            if let Some(text) = outcome.text() {
                buffer.push_str(&format_record(&item.url, text));
                written += 1;
            }
        }

        if written > 0 {
            let path = &self.path;
            let file = &mut self.file;
            file.write_all(buffer.as_bytes())
                .await
                .map_err(|e| io_error(path, e))?;
            file.flush().await.map_err(|e| io_error(path, e))?;
            file.sync_data().await.map_err(|e| io_error(path, e))?;
        }

        self.records_written += written;
        self.batches_flushed += 1;
        debug!(written, total = self.records_written, "Flushed batch");
        Ok(written)
    }
}
