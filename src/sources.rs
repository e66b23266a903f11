//! Source registry: which providers exist and how each is indexed and read.
//!
//! The built-in registry covers ChatGPT, Claude and Grok share pages as
//! indexed by the Wayback Machine CDX API. A YAML or JSON file with the same
//! shape can replace it at startup:
//!
//! ```yaml
//! sources:
//!   - id: chatgpt
//!     name: ChatGPT
//!     index_url: "https://web.archive.org/cdx/search/cdx?url=chatgpt.com/share/*&output=txt&collapse=urlkey&fl=original&page=/"
//!     rule:
//!       selector: "div.prose p"
//! ```

use crate::errors::ConfigError;
use crate::models::{ExtractionRule, Source};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

const CDX_BASE: &str = "https://web.archive.org/cdx/search/cdx";

fn cdx_query(pattern: &str) -> String {
    format!("{CDX_BASE}?url={pattern}&output=txt&collapse=urlkey&fl=original&page=/")
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    sources: Vec<Source>,
}

/// Immutable, ordered set of sources known to this run.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Arc<Source>>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<Source>) -> Result<Self, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::EmptyRegistry);
        }
        Ok(Self {
            sources: sources.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn builtin() -> Self {
        let sources = vec![
            Source {
                id: "chatgpt".into(),
                name: "ChatGPT".into(),
                index_url: cdx_query("chatgpt.com/share/*"),
                rule: ExtractionRule::with_selector("div.prose p"),
            },
            Source {
                id: "claude".into(),
                name: "Claude".into(),
                index_url: cdx_query("https://claude.ai/share/*"),
                rule: ExtractionRule::with_selector(r#"div[class*="Text"]"#),
            },
            Source {
                id: "grok".into(),
                name: "Grok".into(),
                index_url: cdx_query("grok.com/s/*"),
                rule: ExtractionRule::with_selector(r#"div[class*="message"] p"#),
            },
        ];
        Self {
            sources: sources.into_iter().map(Arc::new).collect(),
        }
    }

    /// Load a registry file; `.json` files are read as JSON, anything else as YAML.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file: RegistryFile = if is_json {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)?
        };
        info!(count = file.sources.len(), "Loaded source registry");
        Self::new(file.sources)
    }

    pub fn all(&self) -> &[Arc<Source>] {
        &self.sources
    }

    /// Resolve a `--source` argument.
    ///
    /// Accepts `all` (or `0`), a 1-based position in the registry, or a
    /// case-insensitive id or display name.
    pub fn select(&self, wanted: &str) -> Result<Vec<Arc<Source>>, ConfigError> {
        let wanted = wanted.trim();
        if wanted.eq_ignore_ascii_case("all") || wanted == "0" {
            return Ok(self.sources.clone());
        }
        if let Ok(position) = wanted.parse::<usize>() {
            return self
                .sources
                .get(position.wrapping_sub(1))
                .map(|s| vec![Arc::clone(s)])
                .ok_or_else(|| ConfigError::UnknownSource(wanted.to_string()));
        }
        self.sources
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(wanted) || s.name.eq_ignore_ascii_case(wanted))
            .map(|s| vec![Arc::clone(s)])
            .ok_or_else(|| ConfigError::UnknownSource(wanted.to_string()))
    }
}
