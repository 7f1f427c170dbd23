//! Batched page evaluation.
//!
//! The observer holds the page-side state explicitly: active settings and
//! rules, the anchors already evaluated, the pending batch, and the armed
//! guard that keeps at most one batch outstanding. The host adapter owns
//! the actual timers; it calls [`PageObserver::queue_anchors`] on DOM
//! change and [`PageObserver::process_pending`] when the scheduled batch
//! fires.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use ego_tree::NodeId;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use rb_core::rules::should_block;
use rb_core::settings::Settings;
use rb_core::url::domain_of;

use crate::collect::{collect_candidate_anchors, collect_urls_for_container};
use crate::container::find_result_container;
use crate::mark;
use crate::storage::StoreChange;

/// Idle-callback deadline for a scheduled batch.
pub const BATCH_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// Plain-timer delay when idle scheduling is unavailable.
pub const BATCH_FALLBACK_DELAY: Duration = Duration::from_millis(200);

/// Inbound page queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    GetBlockedCount,
    GetActiveDomain,
}

/// Replies to [`Request`], shaped like the raw objects the host expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    BlockedCount { count: usize },
    ActiveDomain { domain: String },
}

pub struct PageObserver {
    settings: Settings,
    rules: Vec<String>,
    page_url: String,
    processed: HashSet<NodeId>,
    pending: HashSet<NodeId>,
    batch_armed: bool,
    rule_by_container: HashMap<NodeId, String>,
    blocked: usize,
}

impl PageObserver {
    pub fn new(settings: Settings, rules: Vec<String>, page_url: impl Into<String>) -> Self {
        Self {
            settings,
            rules,
            page_url: page_url.into(),
            processed: HashSet::new(),
            pending: HashSet::new(),
            batch_armed: false,
            rule_by_container: HashMap::new(),
            blocked: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Count of currently blocked containers, as of the last batch.
    pub fn blocked_count(&self) -> usize {
        self.blocked
    }

    /// The rule that blocked `container`, if it is blocked.
    pub fn matched_rule(&self, container: NodeId) -> Option<&str> {
        self.rule_by_container.get(&container).map(String::as_str)
    }

    /// Collect candidates under `root` into the pending set.
    ///
    /// Returns `true` when a batch pass became newly armed and the host
    /// should schedule [`process_pending`]; while a batch is armed, later
    /// discoveries fold into the same pending set.
    ///
    /// [`process_pending`]: PageObserver::process_pending
    pub fn queue_anchors(&mut self, html: &Html, root: NodeId) -> bool {
        let root = match html.tree.get(root).and_then(ElementRef::wrap) {
            Some(root) => root,
            None => return false,
        };

        let mut queued = false;
        for anchor in collect_candidate_anchors(root, &self.rules) {
            if !self.processed.contains(&anchor) {
                queued |= self.pending.insert(anchor);
            }
        }

        if !queued || self.batch_armed {
            return false;
        }
        self.batch_armed = true;
        true
    }

    /// Drain and evaluate the pending set. A drained batch always runs to
    /// completion; anchors discovered meanwhile belong to the next batch.
    pub fn process_pending(&mut self, html: &mut Html) {
        self.batch_armed = false;
        let anchors: Vec<NodeId> = self.pending.drain().collect();
        for anchor in anchors {
            self.evaluate_anchor(html, anchor);
        }
        self.update_blocked_count(html);
    }

    fn evaluate_anchor(&mut self, html: &mut Html, anchor_id: NodeId) {
        if !self.settings.enabled {
            return;
        }
        if !self.processed.insert(anchor_id) {
            return;
        }

        let (container_id, urls) = {
            let anchor = match html.tree.get(anchor_id).and_then(ElementRef::wrap) {
                Some(anchor) => anchor,
                None => return,
            };
            let container = match find_result_container(anchor) {
                Some(container) => container,
                None => return,
            };
            let urls = if self.settings.strict_mode {
                collect_urls_for_container(container)
            } else {
                anchor
                    .value()
                    .attr("href")
                    .map(|href| vec![href.to_string()])
                    .unwrap_or_default()
            };
            (container.id(), urls)
        };

        let matched = urls
            .iter()
            .find_map(|url| should_block(url, &self.rules).map(str::to_string));

        match matched {
            Some(rule) => {
                if self.settings.debug_mode {
                    log::debug!("blocking container: rule {rule:?}");
                }
                mark::set_blocked(html, container_id, self.settings.display_mode);
                self.rule_by_container.insert(container_id, rule);
            }
            None => {
                mark::clear_blocked(html, container_id);
                self.rule_by_container.remove(&container_id);
            }
        }
    }

    /// Forget processed anchors and re-queue the whole document.
    /// Existing markings are cleared so stale matches cannot linger.
    pub fn refresh_all(&mut self, html: &mut Html) -> bool {
        self.processed.clear();
        self.clear_blocked_state(html);
        let root = html.root_element().id();
        self.queue_anchors(html, root)
    }

    /// Unmark every blocked container.
    pub fn clear_blocked_state(&mut self, html: &mut Html) {
        mark::clear_all(html);
        self.rule_by_container.clear();
        self.update_blocked_count(html);
    }

    /// Re-derive state from an external store change. Returns `true` when a
    /// batch pass was armed.
    pub fn apply_change(&mut self, html: &mut Html, change: StoreChange) -> bool {
        match change {
            StoreChange::Settings(settings) => {
                self.settings = settings;
                if self.settings.enabled {
                    self.refresh_all(html)
                } else {
                    self.clear_blocked_state(html);
                    false
                }
            }
            StoreChange::Rules(rules) => {
                self.rules = rules;
                self.refresh_all(html)
            }
        }
    }

    pub fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::GetBlockedCount => Response::BlockedCount {
                count: self.blocked,
            },
            Request::GetActiveDomain => Response::ActiveDomain {
                domain: domain_of(&self.page_url),
            },
        }
    }

    fn update_blocked_count(&mut self, html: &Html) {
        self.blocked = mark::blocked_count(html);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::settings::DisplayMode;
    use scraper::Selector;

    const PAGE: &str = r#"
        <div class="g" id="blocked-result">
          <a href="https://example.com/page"><h3>Blocked</h3></a>
          <a href="https://example.com/cached">cached</a>
        </div>
        <div class="g" id="mixed-result">
          <a href="https://fine.test/page"><h3>Fine</h3></a>
          <a href="https://tracker.test/beacon" style="display:none">tracker</a>
        </div>
    "#;

    fn rules(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn container_id(html: &Html, css_id: &str) -> NodeId {
        let selector = Selector::parse(&format!("#{css_id}")).unwrap();
        html.select(&selector).next().unwrap().id()
    }

    fn scan(observer: &mut PageObserver, html: &mut Html) {
        if observer.refresh_all(html) {
            observer.process_pending(html);
        }
    }

    #[test]
    fn test_blocks_matching_result_only() {
        let mut html = Html::parse_document(PAGE);
        let mut observer =
            PageObserver::new(Settings::default(), rules(&["example.com"]), "https://www.google.com/search");
        scan(&mut observer, &mut html);

        let blocked = container_id(&html, "blocked-result");
        let mixed = container_id(&html, "mixed-result");
        assert!(mark::is_blocked(&html, blocked));
        assert!(!mark::is_blocked(&html, mixed));
        assert_eq!(observer.blocked_count(), 1);
        assert_eq!(observer.matched_rule(blocked), Some("example.com"));
    }

    #[test]
    fn test_strict_mode_checks_every_container_url() {
        let mut html = Html::parse_document(PAGE);
        let settings = Settings {
            strict_mode: true,
            ..Settings::default()
        };
        let mut observer = PageObserver::new(settings, rules(&["tracker.test"]), "");
        scan(&mut observer, &mut html);

        // The tracker link is hidden, so it is never a candidate anchor
        // itself; strict mode still checks its href through the container.
        let mixed = container_id(&html, "mixed-result");
        assert!(mark::is_blocked(&html, mixed));
        assert_eq!(observer.matched_rule(mixed), Some("tracker.test"));
    }

    #[test]
    fn test_non_strict_mode_only_checks_primary_anchor() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["tracker.test"]), "");
        scan(&mut observer, &mut html);

        let mixed = container_id(&html, "mixed-result");
        assert!(!mark::is_blocked(&html, mixed));
    }

    #[test]
    fn test_batch_guard_arms_once() {
        let html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["example.com"]), "");
        let root = html.root_element().id();

        assert!(observer.queue_anchors(&html, root));
        // Folded into the already armed batch.
        assert!(!observer.queue_anchors(&html, root));
    }

    #[test]
    fn test_processed_anchors_are_not_reevaluated() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["example.com"]), "");
        scan(&mut observer, &mut html);

        let blocked = container_id(&html, "blocked-result");
        mark::clear_blocked(&mut html, blocked);

        // Re-queue without a refresh: every anchor is already processed.
        let root = html.root_element().id();
        assert!(!observer.queue_anchors(&html, root));
        assert!(!mark::is_blocked(&html, blocked));
    }

    #[test]
    fn test_disable_clears_blocked_state() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["example.com"]), "");
        scan(&mut observer, &mut html);
        assert_eq!(observer.blocked_count(), 1);

        let disabled = Settings {
            enabled: false,
            ..Settings::default()
        };
        let armed = observer.apply_change(&mut html, StoreChange::Settings(disabled));
        assert!(!armed);
        assert_eq!(observer.blocked_count(), 0);
        assert_eq!(mark::blocked_count(&html), 0);
    }

    #[test]
    fn test_rules_change_reevaluates() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["example.com"]), "");
        scan(&mut observer, &mut html);
        assert!(mark::is_blocked(&html, container_id(&html, "blocked-result")));

        if observer.apply_change(&mut html, StoreChange::Rules(rules(&["fine.test"]))) {
            observer.process_pending(&mut html);
        }
        assert!(!mark::is_blocked(&html, container_id(&html, "blocked-result")));
        assert!(mark::is_blocked(&html, container_id(&html, "mixed-result")));
    }

    #[test]
    fn test_display_mode_change_swaps_marking() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(Settings::default(), rules(&["example.com"]), "");
        scan(&mut observer, &mut html);

        let blur = Settings {
            display_mode: DisplayMode::Blur,
            ..Settings::default()
        };
        if observer.apply_change(&mut html, StoreChange::Settings(blur)) {
            observer.process_pending(&mut html);
        }
        let selector = Selector::parse(r#"[data-rb-show-button="true"]"#).unwrap();
        assert_eq!(html.select(&selector).count(), 1);
    }

    #[test]
    fn test_requests() {
        let mut html = Html::parse_document(PAGE);
        let mut observer = PageObserver::new(
            Settings::default(),
            rules(&["example.com"]),
            "https://www.google.com/search?q=test",
        );
        scan(&mut observer, &mut html);

        assert_eq!(
            observer.handle_request(Request::GetBlockedCount),
            Response::BlockedCount { count: 1 }
        );
        assert_eq!(
            observer.handle_request(Request::GetActiveDomain),
            Response::ActiveDomain {
                domain: "www.google.com".to_string()
            }
        );
    }

    #[test]
    fn test_request_wire_format() {
        let request: Request = serde_json::from_str(r#"{"type":"getBlockedCount"}"#).unwrap();
        assert_eq!(request, Request::GetBlockedCount);
        assert_eq!(
            serde_json::to_string(&Response::BlockedCount { count: 3 }).unwrap(),
            r#"{"count":3}"#
        );
        assert_eq!(
            serde_json::to_string(&Response::ActiveDomain {
                domain: "example.com".to_string()
            })
            .unwrap(),
            r#"{"domain":"example.com"}"#
        );
    }

    #[test]
    fn test_disabled_observer_evaluates_nothing() {
        let mut html = Html::parse_document(PAGE);
        let settings = Settings {
            enabled: false,
            ..Settings::default()
        };
        let mut observer = PageObserver::new(settings, rules(&["example.com"]), "");
        scan(&mut observer, &mut html);
        assert_eq!(mark::blocked_count(&html), 0);
    }
}
