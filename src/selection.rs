//! Narrowing a candidate list to the URLs actually scraped this run.
//!
//! Selection runs over the discovery order, which is fixed once per source,
//! so `range` and `count` are reproducible within a run. An invalid policy
//! never truncates silently: it is logged and replaced by [`SelectionPolicy::All`].

use crate::errors::SelectionError;
use std::ops::Range;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    All,
    /// 1-indexed, inclusive on both ends.
    Range { start: usize, end: usize },
    /// The first `n` URLs.
    Count(usize),
}

impl SelectionPolicy {
    /// Parse a `START-END` range argument.
    pub fn parse_range(raw: &str) -> Result<Self, SelectionError> {
        let malformed = || SelectionError::MalformedRange(raw.to_string());
        let (start, end) = raw.split_once('-').ok_or_else(malformed)?;
        let start = start.trim().parse().map_err(|_| malformed())?;
        let end = end.trim().parse().map_err(|_| malformed())?;
        Ok(SelectionPolicy::Range { start, end })
    }

    /// The slice of a `len`-long list this policy keeps.
    pub fn bounds(&self, len: usize) -> Result<Range<usize>, SelectionError> {
        match *self {
            SelectionPolicy::All => Ok(0..len),
            SelectionPolicy::Range { start, end } => {
                if 1 <= start && start <= end && end <= len {
                    Ok(start - 1..end)
                } else {
                    Err(SelectionError::InvalidRange { start, end, len })
                }
            }
            SelectionPolicy::Count(count) => {
                if 1 <= count && count <= len {
                    Ok(0..count)
                } else {
                    Err(SelectionError::InvalidCount { count, len })
                }
            }
        }
    }
}

/// Apply `policy` to `urls`, falling back to every URL when it does not fit.
///
/// # Arguments
///
/// * `urls` - Candidates in discovery order
/// * `policy` - All, a 1-indexed inclusive range, or the first N
///
/// # Returns
///
/// The selected URLs in their original relative order. An out-of-bounds
/// policy is logged as a warning and every URL is returned.
pub fn select(urls: &[String], policy: &SelectionPolicy) -> Vec<String> {
    let range = policy.bounds(urls.len()).unwrap_or_else(|e| {
        warn!(error = %e, ?policy, "Invalid URL selection; using all URLs");
        0..urls.len()
    });
    urls[range].to_vec()
}
