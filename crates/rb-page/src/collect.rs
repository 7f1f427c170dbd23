//! Candidate anchor collection.
//!
//! Pulls the anchors worth evaluating out of a subtree: title links, image
//! result links, and links that already match a rule. Everything else on a
//! results page (navigation, pagination, related searches) stays untouched.

use std::collections::HashSet;

use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};

use rb_core::rules::should_block;
use rb_core::url::{decode_google_url, parse_url};

static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static TITLE_HEADINGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href] h3").expect("valid selector"));
static LINKED_IMAGES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href] img").expect("valid selector"));

/// Static stand-in for a layout visibility check: a headless tree has no
/// geometry, so only explicit hiding is honored.
pub fn is_displayed(element: ElementRef<'_>) -> bool {
    if element.value().attr("hidden").is_some() {
        return false;
    }
    match element.value().attr("style") {
        Some(style) => !style.replace(' ', "").contains("display:none"),
        None => true,
    }
}

fn closest_anchor(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    std::iter::successors(Some(*element), |node: &NodeRef<'_, Node>| node.parent())
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a" && el.value().attr("href").is_some())
}

/// Image results either carry the target in `imgurl=` or route through the
/// image-result endpoint.
fn is_image_result(href: &str) -> bool {
    if decode_google_url(href).contains("imgurl=") {
        return true;
    }
    parse_url(href).is_some_and(|url| url.path().contains("imgres"))
}

fn add(id: NodeId, anchors: &mut Vec<NodeId>, seen: &mut HashSet<NodeId>) {
    if seen.insert(id) {
        anchors.push(id);
    }
}

/// Collect candidate anchors under `root`, deduplicated by node identity
/// and in discovery order.
pub fn collect_candidate_anchors(root: ElementRef<'_>, rules: &[String]) -> Vec<NodeId> {
    let mut anchors: Vec<NodeId> = Vec::new();
    let mut seen: HashSet<NodeId> = HashSet::new();

    // (a) anchors wrapping a title heading
    for heading in root.select(&TITLE_HEADINGS) {
        if !is_displayed(heading) {
            continue;
        }
        if let Some(anchor) = closest_anchor(heading) {
            add(anchor.id(), &mut anchors, &mut seen);
        }
    }

    // (b) anchors wrapping an image whose target is an image result
    for image in root.select(&LINKED_IMAGES) {
        if !is_displayed(image) {
            continue;
        }
        let anchor = match closest_anchor(image) {
            Some(anchor) => anchor,
            None => continue,
        };
        if is_image_result(anchor.value().attr("href").unwrap_or("")) {
            add(anchor.id(), &mut anchors, &mut seen);
        }
    }

    // (c) anchors that already match a rule, whatever they wrap
    for anchor in root.select(&LINK) {
        if !is_displayed(anchor) {
            continue;
        }
        let href = anchor.value().attr("href").unwrap_or("");
        if should_block(href, rules).is_some() {
            add(anchor.id(), &mut anchors, &mut seen);
        }
    }

    anchors
}

/// Every href found inside a container, for strict-mode evaluation.
pub fn collect_urls_for_container(container: ElementRef<'_>) -> Vec<String> {
    container
        .select(&LINK)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn collect(html: &Html, rules: &[String]) -> Vec<String> {
        let anchors = collect_candidate_anchors(html.root_element(), rules);
        anchors
            .into_iter()
            .map(|id| {
                ElementRef::wrap(html.tree.get(id).unwrap())
                    .unwrap()
                    .value()
                    .attr("href")
                    .unwrap()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_collects_title_anchors() {
        let html = Html::parse_document(
            r#"
            <div><a href="https://one.test"><h3>One</h3></a></div>
            <div><a href="https://two.test">no heading</a></div>
            <div><a href="https://three.test"><h3>Three</h3></a></div>
            "#,
        );
        assert_eq!(collect(&html, &[]), ["https://one.test", "https://three.test"]);
    }

    #[test]
    fn test_skips_hidden_headings() {
        let html = Html::parse_document(
            r#"
            <a href="https://shown.test"><h3>Shown</h3></a>
            <a href="https://hidden.test"><h3 hidden>Hidden</h3></a>
            <a href="https://styled.test"><h3 style="display: none">Styled</h3></a>
            "#,
        );
        assert_eq!(collect(&html, &[]), ["https://shown.test"]);
    }

    #[test]
    fn test_collects_image_result_anchors() {
        let html = Html::parse_document(
            r#"
            <a href="https://www.google.com/imgres?imgurl=https://images.example.com/cat.jpg">
              <img src="thumb.jpg" />
            </a>
            <a href="https://plain.test/photo"><img src="photo.jpg" /></a>
            "#,
        );
        assert_eq!(
            collect(&html, &[]),
            ["https://www.google.com/imgres?imgurl=https://images.example.com/cat.jpg"]
        );
    }

    #[test]
    fn test_collects_rule_matched_anchors() {
        let rules = vec!["blocked.test".to_string()];
        let html = Html::parse_document(
            r#"
            <a href="https://blocked.test/page">plain link</a>
            <a href="https://other.test/page">plain link</a>
            "#,
        );
        assert_eq!(collect(&html, &rules), ["https://blocked.test/page"]);
    }

    #[test]
    fn test_deduplicates_across_sources() {
        // A title anchor that also matches a rule shows up once.
        let rules = vec!["one.test".to_string()];
        let html = Html::parse_document(r#"<a href="https://one.test"><h3>One</h3></a>"#);
        assert_eq!(collect(&html, &rules), ["https://one.test"]);
    }

    #[test]
    fn test_collect_urls_for_container() {
        let html = Html::parse_document(
            r#"
            <div id="result">
              <a href="https://one.test"><h3>One</h3></a>
              <a href="https://one.test/related">related</a>
              <a>no href</a>
            </div>
            "#,
        );
        let selector = Selector::parse("#result").unwrap();
        let container = html.select(&selector).next().unwrap();
        assert_eq!(
            collect_urls_for_container(container),
            ["https://one.test", "https://one.test/related"]
        );
    }
}
