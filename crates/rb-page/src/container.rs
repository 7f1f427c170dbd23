//! Result container resolution.
//!
//! Maps a matched anchor to the ancestor element that represents one whole
//! search result. Result markup shifts between layout experiments, so the
//! walk degrades through fallback tiers instead of failing outright,
//! accepting over- or under-inclusion at the edges.

use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};

/// Tags treated as candidate result containers.
const CONTAINER_TAGS: [&str; 3] = ["div", "article", "li"];

/// Ancestor steps examined before the walk gives up.
const MAX_WALK_DEPTH: usize = 10;

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("valid selector"));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

fn is_container_tag(element: ElementRef<'_>) -> bool {
    CONTAINER_TAGS.contains(&element.value().name())
}

/// Exactly one `h3` plus at least one link marks a block holding a single
/// result; more than one heading means the block spans several results.
fn looks_like_result(element: ElementRef<'_>) -> bool {
    element.select(&HEADING).count() == 1 && element.select(&LINK).next().is_some()
}

/// Resolve the result container enclosing `anchor`.
///
/// Walks upward from the anchor, at most [`MAX_WALK_DEPTH`] steps and never
/// past `body`, tracking the first container-tag ancestor and the outermost
/// ancestor that looks like a single result. Resolution order:
///
/// 1. the outermost result-shaped ancestor;
/// 2. the closest container-tag ancestor;
/// 3. the nearest `div` ancestor, or the immediate parent element.
pub fn find_result_container(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let mut closest_block: Option<ElementRef<'_>> = None;
    let mut candidate: Option<ElementRef<'_>> = None;

    let mut current: Option<NodeRef<'_, Node>> = Some(*anchor);
    let mut depth = 0;

    while let Some(node) = current {
        if depth >= MAX_WALK_DEPTH {
            break;
        }
        if let Some(element) = ElementRef::wrap(node) {
            if element.value().name() == "body" {
                break;
            }
            if is_container_tag(element) {
                if closest_block.is_none() {
                    closest_block = Some(element);
                }
                if looks_like_result(element) && element.id() != anchor.id() {
                    candidate = Some(element);
                }
            }
        }
        current = node.parent();
        depth += 1;
    }

    if let Some(found) = candidate {
        log::debug!("resolved result container for anchor");
        return Some(found);
    }
    if let Some(block) = closest_block {
        log::warn!("no result-shaped ancestor, falling back to closest block");
        return Some(block);
    }

    let fallback = std::iter::successors(Some(*anchor), |node: &NodeRef<'_, Node>| node.parent())
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "div")
        .or_else(|| anchor.parent().and_then(ElementRef::wrap));
    if fallback.is_some() {
        log::warn!("no block-level ancestor, falling back to nearest container");
    }
    fallback
}
