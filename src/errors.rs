//! Error types for each stage of the scrape pipeline.
//!
//! Only [`DiscoveryError`] (aborts one source), [`SinkError`] and
//! [`ConfigError`] (abort the run) ever leave the pipeline. [`RenderError`]
//! is folded into a `Failed` outcome by the scheduler, and [`SelectionError`]
//! degrades the selection policy to `all`.

use std::time::Duration;
use thiserror::Error;

/// The index listing for a source could not be fetched.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("index request timed out")]
    Timeout,
    #[error("index endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("index request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DiscoveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DiscoveryError::Timeout
        } else if let Some(status) = e.status() {
            DiscoveryError::Status(status)
        } else {
            DiscoveryError::Transport(e)
        }
    }
}

/// A selection policy that does not fit the candidate list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("range {start}-{end} is outside 1..={len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("count {count} is outside 1..={len}")]
    InvalidCount { count: usize, len: usize },
    #[error("range '{0}' is not of the form START-END")]
    MalformedRange(String),
    #[error("mode '{0}' needs its parameter")]
    MissingParameter(&'static str),
}

/// Faults raised by the renderer while loading or querying a page.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),
    #[error("selector '{selector}' did not appear within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("page returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page crashed: {0}")]
    Crashed(String),
}

/// Writing to the output store failed.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("output store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Startup configuration could not be loaded or resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing YAML registry: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("parsing JSON registry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no source matches '{0}'")]
    UnknownSource(String),
    #[error("source registry is empty")]
    EmptyRegistry,
    #[error("building http client: {0}")]
    Client(#[from] reqwest::Error),
}
