//! Static-document driver.
//!
//! Binds a parsed document to an observer and drains armed batches
//! synchronously. Tests and the CLI drive the engine through this type; a
//! live browser adapter replaces it with mutation events feeding the same
//! observer.

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use rb_core::settings::Settings;

use crate::mark;
use crate::observer::{PageObserver, Request, Response};
use crate::storage::StoreChange;
use crate::style;

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("valid selector"));

/// One blocked container, for reporting surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedResult {
    /// Text of the result's heading, empty when the container has none.
    pub title: String,
    /// The rule that blocked it.
    pub rule: String,
}

pub struct Page {
    html: Html,
    observer: PageObserver,
}

impl Page {
    pub fn new(document: &str, page_url: &str, settings: Settings, rules: Vec<String>) -> Self {
        let html = Html::parse_document(document);
        let observer = PageObserver::new(settings, rules, page_url);
        Self { html, observer }
    }

    /// Evaluate the whole document, draining the armed batch.
    pub fn scan(&mut self) {
        if self.observer.refresh_all(&mut self.html) {
            self.observer.process_pending(&mut self.html);
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.observer.blocked_count()
    }

    /// Currently blocked containers in document order.
    pub fn blocked_containers(&self) -> Vec<NodeId> {
        mark::blocked_containers(&self.html)
    }

    /// Blocked containers with their headings and matched rules, in
    /// document order.
    pub fn blocked_results(&self) -> Vec<BlockedResult> {
        self.blocked_containers()
            .into_iter()
            .map(|container| BlockedResult {
                title: self.container_title(container),
                rule: self
                    .observer
                    .matched_rule(container)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect()
    }

    /// The reveal control's click action for a blocked container.
    pub fn reveal(&mut self, container: NodeId) {
        mark::reveal(&mut self.html, container);
    }

    pub fn is_revealed(&self, container: NodeId) -> bool {
        mark::is_revealed(&self.html, container)
    }

    pub fn handle_request(&self, request: Request) -> Response {
        self.observer.handle_request(request)
    }

    /// Apply an external store change, draining any armed batch.
    pub fn apply_change(&mut self, change: StoreChange) {
        if self.observer.apply_change(&mut self.html, change) {
            self.observer.process_pending(&mut self.html);
        }
    }

    /// Stylesheet for the active display mode.
    pub fn style_content(&self) -> String {
        style::style_content(self.observer.settings().display_mode)
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn observer(&self) -> &PageObserver {
        &self.observer
    }

    fn container_title(&self, container: NodeId) -> String {
        self.html
            .tree
            .get(container)
            .and_then(ElementRef::wrap)
            .and_then(|element| {
                element
                    .select(&HEADING)
                    .next()
                    .map(|heading| heading.text().collect::<String>().trim().to_string())
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::settings::DisplayMode;

    const PAGE: &str = r#"
        <div id="results">
          <div class="g" id="result-one">
            <a href="https://blocked.example.com/page"><h3>Blocked Result</h3></a>
          </div>
          <div class="g" id="result-two">
            <a href="https://allowed.example.com/page"><h3>Allowed Result</h3></a>
          </div>
        </div>
    "#;

    fn page_with(settings: Settings, rules: &[&str]) -> Page {
        Page::new(
            PAGE,
            "https://www.google.com/search?q=test",
            settings,
            rules.iter().map(|rule| rule.to_string()).collect(),
        )
    }

    #[test]
    fn test_scan_blocks_matching_results() {
        let mut page = page_with(Settings::default(), &["blocked.example.com"]);
        page.scan();

        assert_eq!(page.blocked_count(), 1);
        assert_eq!(
            page.blocked_results(),
            vec![BlockedResult {
                title: "Blocked Result".to_string(),
                rule: "blocked.example.com".to_string(),
            }]
        );
    }

    #[test]
    fn test_scan_twice_is_stable() {
        let mut page = page_with(Settings::default(), &["blocked.example.com"]);
        page.scan();
        page.scan();
        assert_eq!(page.blocked_count(), 1);
    }

    #[test]
    fn test_reveal_flow_in_blur_mode() {
        let settings = Settings {
            display_mode: DisplayMode::Blur,
            ..Settings::default()
        };
        let mut page = page_with(settings, &["blocked.example.com"]);
        page.scan();

        let container = page.blocked_containers()[0];
        assert!(!page.is_revealed(container));
        page.reveal(container);
        assert!(page.is_revealed(container));
    }

    #[test]
    fn test_requests_route_through_observer() {
        let mut page = page_with(Settings::default(), &["blocked.example.com"]);
        page.scan();

        assert_eq!(
            page.handle_request(Request::GetBlockedCount),
            Response::BlockedCount { count: 1 }
        );
        assert_eq!(
            page.handle_request(Request::GetActiveDomain),
            Response::ActiveDomain {
                domain: "www.google.com".to_string()
            }
        );
    }

    #[test]
    fn test_store_changes_apply() {
        let mut page = page_with(Settings::default(), &["blocked.example.com"]);
        page.scan();
        assert_eq!(page.blocked_count(), 1);

        page.apply_change(StoreChange::Rules(vec!["allowed.example.com".to_string()]));
        let results = page.blocked_results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Allowed Result");

        page.apply_change(StoreChange::Settings(Settings {
            enabled: false,
            ..Settings::default()
        }));
        assert_eq!(page.blocked_count(), 0);
    }

    #[test]
    fn test_style_follows_display_mode() {
        let page = page_with(Settings::default(), &[]);
        assert!(page.style_content().contains("display: none"));

        let blur = page_with(
            Settings {
                display_mode: DisplayMode::Blur,
                ..Settings::default()
            },
            &[],
        );
        assert!(blur.style_content().contains("blur(4px)"));
    }
}
