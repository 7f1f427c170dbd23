//! Blocked-state marking.
//!
//! The DOM contract: a blocked container carries `data-rb-blocked="true"`;
//! in blur mode a single reveal button is injected whose click sets
//! `data-rb-revealed="true"`. Unmarking removes both attributes and the
//! button. Every operation is idempotent, so re-marking an already blocked
//! container leaves the tree unchanged.

use ego_tree::{NodeId, NodeRef};
use html5ever::tendril::StrTendril;
use html5ever::{namespace_url, ns, LocalName, QualName};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use rb_core::settings::DisplayMode;

pub const BLOCKED_ATTR: &str = "data-rb-blocked";
pub const REVEALED_ATTR: &str = "data-rb-revealed";
pub const SHOW_BUTTON_ATTR: &str = "data-rb-show-button";

static BLOCKED: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-rb-blocked="true"]"#).expect("valid selector"));
static BUTTON: Lazy<Selector> = Lazy::new(|| Selector::parse("button").expect("valid selector"));

fn attr_name(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

fn set_attr(html: &mut Html, id: NodeId, name: &str, value: &str) {
    if let Some(mut node) = html.tree.get_mut(id) {
        if let Node::Element(element) = node.value() {
            element.attrs.insert(attr_name(name), StrTendril::from(value));
        }
    }
}

fn remove_attr(html: &mut Html, id: NodeId, name: &str) {
    if let Some(mut node) = html.tree.get_mut(id) {
        if let Node::Element(element) = node.value() {
            element.attrs.retain(|attr, _| &*attr.local != name);
        }
    }
}

fn has_attr(html: &Html, id: NodeId, name: &str) -> bool {
    html.tree
        .get(id)
        .and_then(ElementRef::wrap)
        .and_then(|element| element.value().attr(name))
        == Some("true")
}

fn find_show_button(html: &Html, container: NodeId) -> Option<NodeId> {
    let node = html.tree.get(container)?;
    node.descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().attr(SHOW_BUTTON_ATTR) == Some("true"))
        .map(|element| element.id())
}

/// Clone `source` (and its subtree) from another document under `parent`.
fn append_subtree(html: &mut Html, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
    let child = {
        let mut parent = html.tree.get_mut(parent)?;
        parent.append(source.value().clone()).id()
    };
    for grandchild in source.children() {
        append_subtree(html, child, grandchild);
    }
    Some(child)
}

fn ensure_show_button(html: &mut Html, container: NodeId) {
    if find_show_button(html, container).is_some() {
        return;
    }
    let fragment = Html::parse_fragment(
        r#"<button type="button" data-rb-show-button="true">Show</button>"#,
    );
    if let Some(button) = fragment.select(&BUTTON).next() {
        append_subtree(html, container, *button);
    }
}

/// Mark a container blocked. In blur mode a reveal control is injected;
/// marking twice leaves the same tree state as marking once.
pub fn set_blocked(html: &mut Html, container: NodeId, mode: DisplayMode) {
    set_attr(html, container, BLOCKED_ATTR, "true");
    if mode == DisplayMode::Blur {
        ensure_show_button(html, container);
    }
}

/// Remove the blocked and revealed attributes and any injected control.
pub fn clear_blocked(html: &mut Html, container: NodeId) {
    remove_attr(html, container, BLOCKED_ATTR);
    remove_attr(html, container, REVEALED_ATTR);
    if let Some(button) = find_show_button(html, container) {
        if let Some(mut node) = html.tree.get_mut(button) {
            node.detach();
        }
    }
}

/// The reveal control's click action. Suppressing event propagation to the
/// underlying page is the host adapter's business.
pub fn reveal(html: &mut Html, container: NodeId) {
    if is_blocked(html, container) {
        set_attr(html, container, REVEALED_ATTR, "true");
    }
}

pub fn is_blocked(html: &Html, container: NodeId) -> bool {
    has_attr(html, container, BLOCKED_ATTR)
}

pub fn is_revealed(html: &Html, container: NodeId) -> bool {
    has_attr(html, container, REVEALED_ATTR)
}

/// Currently blocked containers in document order.
pub fn blocked_containers(html: &Html) -> Vec<NodeId> {
    html.select(&BLOCKED).map(|element| element.id()).collect()
}

pub fn blocked_count(html: &Html) -> usize {
    html.select(&BLOCKED).count()
}

/// Unmark every blocked container.
pub fn clear_all(html: &mut Html) {
    for container in blocked_containers(html) {
        clear_blocked(html, container);
    }
}
