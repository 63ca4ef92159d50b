//! Stylesheet discovery in a document.
//!
//! Fetching is left to the caller: these helpers only report where stylesheet
//! text comes from, in document order.

use marten_dom::{DomTree, ElementData, NodeId};

/// [HTML Standard § 4.2.6 The style element](https://html.spec.whatwg.org/multipage/semantics.html#the-style-element)
///
/// Concatenated text of all `<style>` elements, one block per line.
#[must_use]
pub fn extract_style_content(tree: &DomTree) -> String {
    let mut css = String::new();
    for id in tree.descendants_inclusive(NodeId::ROOT) {
        let is_style = tree
            .as_element(id)
            .is_some_and(|data| data.tag_name.eq_ignore_ascii_case("style"));
        if !is_style {
            continue;
        }
        for &child in tree.children(id) {
            if let Some(text) = tree.as_text(child) {
                css.push_str(text);
                css.push('\n');
            }
        }
    }
    css
}

/// [§ 4.2.4 The link element](https://html.spec.whatwg.org/multipage/semantics.html#the-link-element)
///
/// `href` values of `<link rel="stylesheet">` elements, in document order.
/// Links whose `media` is exactly `print` are left out.
#[must_use]
pub fn stylesheet_hrefs(tree: &DomTree) -> Vec<String> {
    tree.descendants_inclusive(NodeId::ROOT)
        .into_iter()
        .filter_map(|id| tree.as_element(id))
        .filter(|data| data.tag_name.eq_ignore_ascii_case("link") && is_stylesheet_link(data))
        .filter(|data| !data.attr("media").is_some_and(|media| media.trim().eq_ignore_ascii_case("print")))
        .filter_map(|data| data.attr("href"))
        .filter(|href| !href.trim().is_empty())
        .map(|href| href.trim().to_string())
        .collect()
}

/// "If the rel attribute's value contains the token stylesheet,
/// then the link is a stylesheet link."
fn is_stylesheet_link(data: &ElementData) -> bool {
    data.attr("rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}
