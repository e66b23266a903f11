//! Static HTML renderer.
//!
//! Fetches share pages with one long-lived `reqwest` client and answers
//! selector queries with `scraper`. Pages that only fill in their content
//! via JavaScript come back without matches and resolve as `Empty`.

use super::{PageHandle, Renderer, TextNode};
use crate::errors::{ConfigError, RenderError};
use ego_tree::NodeRef;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Renderer backed by a shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Build a renderer, optionally routing every request through `proxy`
    /// (`http://`, `https://` or `socks5://`).
    pub fn new(proxy: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Renderer for HttpRenderer {
    type Page = HtmlPage;

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn open(
        &self,
        url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<HtmlPage, RenderError> {
        let parsed = Url::parse(url).map_err(|e| RenderError::InvalidUrl(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| navigation_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RenderError::NavigationTimeout(timeout)
            } else {
                RenderError::Crashed(format!("reading body: {e}"))
            }
        })?;
        debug!(bytes = body.len(), "Loaded page");
        Ok(HtmlPage {
            url: url.to_string(),
            body,
        })
    }
}

fn navigation_error(e: reqwest::Error, timeout: Duration) -> RenderError {
    if e.is_timeout() {
        RenderError::NavigationTimeout(timeout)
    } else {
        RenderError::Http(e)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|e| RenderError::InvalidSelector(format!("{selector}: {e}")))
}

/// Elements whose content is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start and end on their own line.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Collect the visible text of every node matching `selector`.
fn select_text(body: &str, selector: &Selector) -> Vec<TextNode> {
    let document = Html::parse_document(body);
    document
        .select(selector)
        .map(|element| TextNode::new(visible_text(element)))
        .collect()
}

/// Approximate a browser's `innerText`: hidden subtrees are skipped, block
/// boundaries and `<br>` become line breaks, and whitespace runs inside a
/// line collapse to a single space.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_visible(*element, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_visible(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let name = element.name();
            if HIDDEN_ELEMENTS.contains(&name) {
                return;
            }
            if name == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_ELEMENTS.contains(&name);
            if block {
                out.push('\n');
            }
            for child in node.children() {
                push_visible(child, out);
            }
            if block {
                out.push('\n');
            }
        }
        _ => {
            for child in node.children() {
                push_visible(child, out);
            }
        }
    }
}

/// A fully loaded static document.
#[derive(Debug)]
pub struct HtmlPage {
    url: String,
    body: String,
}

impl PageHandle for HtmlPage {
    /// A static document is complete once loaded, so there is nothing to
    /// wait for beyond checking that the selector parses.
    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), RenderError> {
        parse_selector(selector).map(|_| ())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<TextNode>, RenderError> {
        let selector = parse_selector(selector)?;
        Ok(select_text(&self.body, &selector))
    }

    async fn close(self) {
        debug!(url = %self.url, "Closed page");
    }
}
