//! Share URL discovery from a source's index endpoint.
//!
//! The index is fetched once per source; its body is a newline-delimited
//! listing. Blank lines are dropped and duplicates collapse to their first
//! occurrence by exact string equality, so the result is a set that still
//! carries a fixed discovery order for the selector to slice.

use crate::errors::DiscoveryError;
use crate::models::Source;
use itertools::Itertools;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use tracing::{debug, info, instrument};

/// Turn a raw index listing into deduplicated candidate URLs.
///
/// Only the line terminator (`\n` or `\r\n`) is stripped. Lines are
/// otherwise compared verbatim, so `"u"` and `" u"` are distinct candidates.
pub fn parse_listing(body: &str) -> Vec<String> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

/// Fetch and parse the index listing for `source`.
///
/// No retry happens here: a failure is reported to the caller, which skips
/// the source. An empty listing is returned as an empty vector.
///
/// # Errors
///
/// Returns [`DiscoveryError`] on transport failure, timeout, or any
/// non-success status.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn discover(
    client: &Client,
    source: &Source,
    user_agent: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let response = client
        .get(&source.index_url)
        .header(USER_AGENT, user_agent)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status(status));
    }

    let body = response.text().await?;
    let urls = parse_listing(&body);
    info!(count = urls.len(), "Discovered share URLs");
    debug!(urls = ?urls, "Candidate URLs");
    Ok(urls)
}
