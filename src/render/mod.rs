//! The rendering capability the pipeline drives.
//!
//! The pipeline only ever sees these traits: open a URL into a page handle,
//! wait for a selector, query text nodes, close the page. Any engine that
//! can answer those calls can sit behind them.
//!
//! | Binding | Module | Notes |
//! |---------|--------|-------|
//! | Static HTML over HTTP | [`http`] | `reqwest` fetch + `scraper` CSS selection |

pub mod http;

use crate::errors::RenderError;
use std::time::Duration;

/// A matched node's visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    text: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn inner_text(&self) -> &str {
        &self.text
    }
}

/// A loaded page, exclusively owned by one fetch until [`PageHandle::close`].
pub trait PageHandle {
    /// Resolve once `selector` matches, or fail after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
    -> Result<(), RenderError>;

    /// Every node matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<TextNode>, RenderError>;

    /// Release the page and whatever session resources it holds.
    async fn close(self);
}

/// Session factory shared by all concurrent fetches.
pub trait Renderer {
    type Page: PageHandle;

    /// Navigate to `url`. Implementations should honour `timeout`; the
    /// scheduler also enforces it from the outside.
    async fn open(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self::Page, RenderError>;
}
