//! Command-line interface definitions for the share scraper.
//!
//! All arguments can be provided via command-line flags or environment variables.

use crate::errors::SelectionError;
use crate::selection::SelectionPolicy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How the discovered URL list is narrowed before scraping.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    All,
    Range,
    Number,
}

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Every source, every URL, 10 pages in flight
/// share_scraper
///
/// # Claude only, URLs 1 through 50, over Tor
/// share_scraper --source claude --mode range --range 1-50 --proxy socks5://127.0.0.1:9050
///
/// # First 20 ChatGPT URLs, 4 at a time
/// share_scraper --source 1 --mode number --count 20 --parallel 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// HTTP or SOCKS proxy (e.g. socks5://127.0.0.1:9050)
    #[arg(long, env = "SCRAPER_PROXY")]
    pub proxy: Option<String>,

    /// Source to scrape: `all`, a source id/name, or its 1-based position (0 = all)
    #[arg(long, env = "SCRAPER_SOURCE", default_value = "all")]
    pub source: String,

    /// URL selection mode
    #[arg(long, value_enum, default_value_t = Mode::All)]
    pub mode: Mode,

    /// Range of URLs for `--mode range`, 1-indexed and inclusive (e.g. 1-10)
    #[arg(long)]
    pub range: Option<String>,

    /// Number of URLs for `--mode number`
    #[arg(long)]
    pub count: Option<usize>,

    /// Number of pages fetched concurrently
    #[arg(long, env = "SCRAPER_PARALLEL", default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub parallel: u16,

    /// Output file (defaults to /app/output/scraped_content.txt in the container, else ./scraped_content.txt)
    #[arg(short, long, env = "SCRAPER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Optional YAML or JSON source registry replacing the built-in sources
    #[arg(short, long, env = "SCRAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Navigation and selector-wait timeout in seconds
    #[arg(long, env = "SCRAPER_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Cli {
    /// Build the selection policy from `--mode` and its parameter.
    pub fn selection_policy(&self) -> Result<SelectionPolicy, SelectionError> {
        match self.mode {
            Mode::All => Ok(SelectionPolicy::All),
            Mode::Range => {
                let raw = self
                    .range
                    .as_deref()
                    .ok_or(SelectionError::MissingParameter("range"))?;
                SelectionPolicy::parse_range(raw)
            }
            Mode::Number => self
                .count
                .map(SelectionPolicy::Count)
                .ok_or(SelectionError::MissingParameter("number")),
        }
    }
}
