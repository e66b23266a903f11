//! Turning a rendered share page into cleaned conversation text.
//!
//! Extraction is rule-driven: the page is queried with the source's selector,
//! short fragments and boilerplate are dropped, and what remains is joined
//! with blank lines in document order.
//!
//! Renderer faults (selector wait timeout, crash) become
//! [`ScrapeOutcome::Failed`]; a page that loads but yields nothing usable is
//! [`ScrapeOutcome::Empty`].

use crate::errors::RenderError;
use crate::models::{ExtractionRule, ScrapeOutcome};
use crate::render::PageHandle;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument};

/// Whether `fragment` passes the rule's length and denylist checks.
pub fn keep_fragment(fragment: &str, rule: &ExtractionRule) -> bool {
    if fragment.split_whitespace().count() <= rule.min_words {
        return false;
    }
    let lowered = fragment.to_lowercase();
    !rule
        .unwanted_phrases
        .iter()
        .any(|phrase| lowered.contains(&phrase.to_lowercase()))
}

/// Filter and join raw node texts. `None` when nothing survives.
pub fn clean_fragments<'a, I>(fragments: I, rule: &ExtractionRule) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let kept: Vec<&str> = fragments
        .into_iter()
        .map(str::trim)
        .filter(|fragment| keep_fragment(fragment, rule))
        .collect();

    if kept.is_empty() {
        return None;
    }
    Some(kept.join("\n\n").trim().to_string())
}

/// Run `rule` against an open page.
///
/// # Arguments
///
/// * `page` - A loaded page; it is only read, closing stays with the caller
/// * `rule` - Selector, denylist and word threshold for the source
/// * `wait_timeout` - Upper bound on waiting for the selector
///
/// # Returns
///
/// `Success` with the cleaned text, `Empty` when the page loaded but no
/// fragment qualified, or `Failed` when the selector wait faulted or timed out.
#[instrument(level = "debug", skip_all, fields(selector = %rule.selector))]
pub async fn extract<P: PageHandle>(
    page: &P,
    rule: &ExtractionRule,
    wait_timeout: Duration,
) -> ScrapeOutcome {
    let waited = timeout(wait_timeout, page.wait_for_selector(&rule.selector, wait_timeout)).await;
    match waited {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return ScrapeOutcome::Failed(e.to_string()),
        Err(_) => {
            let e = RenderError::SelectorTimeout {
                selector: rule.selector.clone(),
                timeout: wait_timeout,
            };
            return ScrapeOutcome::Failed(e.to_string());
        }
    }

    let nodes = match page.query_all(&rule.selector).await {
        Ok(nodes) => nodes,
        Err(e) => return ScrapeOutcome::Failed(e.to_string()),
    };
    if nodes.is_empty() {
        debug!("No nodes matched");
        return ScrapeOutcome::Empty;
    }

    let matched = nodes.len();
    match clean_fragments(nodes.iter().map(|node| node.inner_text()), rule) {
        Some(text) => {
            debug!(matched, bytes = text.len(), "Extracted conversation text");
            ScrapeOutcome::Success(text)
        }
        None => {
            debug!(matched, "Every fragment was filtered out");
            ScrapeOutcome::Empty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TextNode;

    /// In-memory page answering every query with fixed texts.
    struct StaticPage {
        texts: Vec<String>,
        wait: Result<(), fn() -> RenderError>,
        wait_delay: Duration,
    }

    impl StaticPage {
        fn new(texts: &[&str]) -> Self {
            Self {
                texts: texts.iter().map(|t| t.to_string()).collect(),
                wait: Ok(()),
                wait_delay: Duration::ZERO,
            }
        }
    }

    impl PageHandle for StaticPage {
        async fn wait_for_selector(&self, _: &str, _: Duration) -> Result<(), RenderError> {
            tokio::time::sleep(self.wait_delay).await;
            self.wait.map_err(|make| make())
        }

        async fn query_all(&self, _: &str) -> Result<Vec<TextNode>, RenderError> {
            Ok(self.texts.iter().map(TextNode::new).collect())
        }

        async fn close(self) {}
    }

    fn rule() -> ExtractionRule {
        ExtractionRule::default()
    }

    #[test]
    fn five_words_is_not_enough() {
        assert!(!keep_fragment("one two three four five", &rule()));
        assert!(keep_fragment("one two three four five six", &rule()));
    }

    #[test]
    fn unwanted_phrases_match_case_insensitively() {
        assert!(!keep_fragment("please SIGN UP now to see more", &rule()));
        assert!(!keep_fragment("ChatGPT can make mistakes. Check important info.", &rule()));
        assert!(keep_fragment("how do I sign a PDF file quickly", &rule()));
    }

    #[test]
    fn clean_joins_with_blank_lines_in_order() {
        let text = clean_fragments(
            [
                "  first kept fragment has six words  ",
                "too short",
                "Log in to continue this conversation please",
                "second kept fragment also has six",
            ],
            &rule(),
        );
        assert_eq!(
            text.as_deref(),
            Some("first kept fragment has six words\n\nsecond kept fragment also has six")
        );
    }

    #[test]
    fn clean_returns_none_when_everything_is_dropped() {
        assert_eq!(clean_fragments(["short", "Skip to content"], &rule()), None);
    }

    #[test]
    fn custom_threshold_applies() {
        let rule = ExtractionRule {
            min_words: 1,
            unwanted_phrases: vec![],
            ..ExtractionRule::default()
        };
        assert!(keep_fragment("two words", &rule));
        assert!(!keep_fragment("one", &rule));
    }

    #[tokio::test]
    async fn extract_success() {
        let page = StaticPage::new(&["hello world this is fine message", "nope"]);
        let outcome = extract(&page, &rule(), Duration::from_secs(30)).await;
        assert_eq!(
            outcome,
            ScrapeOutcome::Success("hello world this is fine message".into())
        );
    }

    #[tokio::test]
    async fn extract_empty_when_nothing_matches() {
        let page = StaticPage::new(&[]);
        assert_eq!(extract(&page, &rule(), Duration::from_secs(30)).await, ScrapeOutcome::Empty);
    }

    #[tokio::test]
    async fn extract_empty_when_everything_is_filtered() {
        let page = StaticPage::new(&["What can I help with today, friend?", "hi"]);
        assert_eq!(extract(&page, &rule(), Duration::from_secs(30)).await, ScrapeOutcome::Empty);
    }

    #[tokio::test]
    async fn renderer_fault_is_failed_not_empty() {
        let mut page = StaticPage::new(&["ignored because the page crashed badly"]);
        page.wait = Err(|| RenderError::Crashed("target closed".into()));
        let outcome = extract(&page, &rule(), Duration::from_secs(30)).await;
        assert!(matches!(outcome, ScrapeOutcome::Failed(reason) if reason.contains("target closed")));
    }

    #[tokio::test(start_paused = true)]
    async fn selector_wait_is_bounded() {
        let mut page = StaticPage::new(&["never seen"]);
        page.wait_delay = Duration::from_secs(120);
        let outcome = extract(&page, &rule(), Duration::from_secs(30)).await;
        assert!(matches!(outcome, ScrapeOutcome::Failed(reason) if reason.contains("did not appear")));
    }
}
