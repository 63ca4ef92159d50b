//! Integration tests for rule collapsing, sheet merging and the cascade.

use marten_css::CssParser;
use marten_dom::{DomTree, NodeId, SourceNode};
use marten_style::cascade::NodeMap;
use marten_style::{RenderTree, StyleEngine, StyleMap, Viewport};

/// `<html><body>{children}</body></html>`
fn page(children: Vec<SourceNode>) -> DomTree {
    DomTree::from_source(&SourceNode::element(
        "html",
        vec![SourceNode::element("body", children)],
    ))
}

fn resolve_style(doc: &DomTree, sheets: &[&str], tag: &str) -> StyleMap {
    let tree = StyleEngine::new().resolve(doc, sheets).unwrap();
    tree.root()
        .find_first_descendant(tag)
        .unwrap_or_else(|| panic!("no <{tag}> in render tree"))
        .resolved_style()
        .clone()
}

#[test]
fn test_last_matching_rule_wins() {
    let doc = page(vec![SourceNode::element("h1", vec![SourceNode::text("Title")])]);
    let style = resolve_style(&doc, &["h1 { color: red } h1 { color: blue }"], "h1");
    assert_eq!(style.css("color"), "blue");
}

#[test]
fn test_important_is_never_overwritten_by_later_rules() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let css = "p { color: grey !important } p { color: red !important } p { color: blue }";
    let style = resolve_style(&doc, &[css], "p");
    assert_eq!(style.css("color"), "grey");
    assert!(style.get("color").unwrap().important);
}

#[test]
fn test_inline_style_beats_important_rule() {
    let doc = page(vec![SourceNode::element_with(
        "p",
        &[("style", "color:green")],
        vec![],
    )]);
    let style = resolve_style(&doc, &["p{color:grey!important}"], "p");
    assert_eq!(style.css("color"), "green");
}

#[test]
fn test_inline_inherit_keeps_matched_value() {
    let doc = page(vec![SourceNode::element_with(
        "p",
        &[("style", "color: inherit; margin: 3px")],
        vec![],
    )]);
    let style = resolve_style(&doc, &["p { color: grey !important }"], "p");
    assert_eq!(style.css("color"), "grey");
    assert_eq!(style.css("margin"), "3px");
}

#[test]
fn test_only_inherited_properties_reach_children() {
    let doc = page(vec![SourceNode::element(
        "div",
        vec![SourceNode::element("em", vec![])],
    )]);
    let style = resolve_style(
        &doc,
        &["div { color: red; font-size: 14px; border: 1px solid; padding: 4px }"],
        "em",
    );
    assert_eq!(style.css("color"), "red");
    assert_eq!(style.css("font-size"), "14px");
    assert!(!style.contains("border"));
    assert!(!style.contains("padding"));
    // from the add-on stylesheet
    assert_eq!(style.css("display"), "inline");
}

#[test]
fn test_matched_inherit_keeps_parent_value() {
    let doc = page(vec![SourceNode::element(
        "div",
        vec![SourceNode::element("p", vec![])],
    )]);
    let style = resolve_style(&doc, &["div { color: red } p { color: inherit }"], "p");
    assert_eq!(style.css("color"), "red");
}

#[test]
fn test_text_nodes_are_always_inline() {
    let doc = page(vec![SourceNode::element(
        "div",
        vec![SourceNode::text("hello")],
    )]);
    let body = doc.body().unwrap();
    let div = doc.children(body)[0];
    let text = doc.children(div)[0];

    // Pretend a rule matched the text run itself.
    let mut node_map = NodeMap::new();
    let mut matched = StyleMap::new();
    matched.set_css("display", "block");
    matched.set_css("color", "red");
    let _ = node_map.insert(text, matched);
    let mut div_style = StyleMap::new();
    div_style.set_css("display", "flex");
    let _ = node_map.insert(div, div_style);

    let tree = RenderTree::build(
        &doc,
        body,
        &node_map,
        &CssParser,
        StyleEngine::new().context(),
    )
    .unwrap();
    let div_node = tree.root().find_first_descendant("div").unwrap();
    let text_node = div_node.children().next().unwrap();

    assert_eq!(div_node.resolved_style().css("display"), "flex");
    assert_eq!(text_node.text(), "hello");
    assert_eq!(text_node.resolved_style().css("display"), "inline");
    assert_eq!(text_node.resolved_style().css("color"), "red");
}

#[test]
fn test_resolution_is_idempotent() {
    let doc = page(vec![
        SourceNode::element_with("div", &[("id", "a"), ("style", "width: 50%")], vec![
            SourceNode::text("one"),
            SourceNode::element("span", vec![SourceNode::text("two")]),
        ]),
        SourceNode::element("p", vec![SourceNode::text("three")]),
    ]);
    let sheets = ["div { color: red !important } span { color: blue }", "p { margin: 1em }"];
    let engine = StyleEngine::new();

    let first = engine.resolve(&doc, &sheets).unwrap();
    let second = engine.resolve(&doc, &sheets).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_media_query_applies_by_viewport_width() {
    let doc = page(vec![]);
    let css = "@media only screen and (max-width: 600px) { body { background-color: lightblue } }";

    let wide = StyleEngine::new().with_viewport(Viewport {
        width: 800.0,
        height: 600.0,
    });
    let tree = wide.resolve(&doc, &[css]).unwrap();
    assert!(!tree.root().resolved_style().contains("background-color"));

    let narrow = StyleEngine::new().with_viewport(Viewport {
        width: 400.0,
        height: 600.0,
    });
    let tree = narrow.resolve(&doc, &[css]).unwrap();
    assert_eq!(tree.root().resolved_style().css("background-color"), "lightblue");
}

#[test]
fn test_media_rules_keep_document_order() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let css = "p { color: red } @media (min-width: 100px) { p { color: green } } p { margin: 0 }";
    let style = resolve_style(&doc, &[css], "p");
    assert_eq!(style.css("color"), "green");

    let css = "@media (min-width: 100px) { p { color: green } } p { color: red }";
    let style = resolve_style(&doc, &[css], "p");
    assert_eq!(style.css("color"), "red");
}

#[test]
fn test_print_media_is_ignored() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let style = resolve_style(&doc, &["@media print { p { color: black } }"], "p");
    assert!(!style.contains("color"));
}

#[test]
fn test_bgcolor_attribute() {
    let doc = page(vec![SourceNode::element_with(
        "table",
        &[("bgcolor", "#ff0000")],
        vec![],
    )]);
    let style = resolve_style(&doc, &[], "table");
    assert_eq!(style.css("background-color"), "#ff0000");
    assert_eq!(style.background_color().unwrap().to_rgba_u32(), 0xff00_00ff);
}

#[test]
fn test_later_sheet_overrides_earlier_important() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let style = resolve_style(&doc, &["p { color: red !important }", "p { color: blue }"], "p");
    assert_eq!(style.css("color"), "blue");
}

#[test]
fn test_unparsable_sheet_is_skipped() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let style = resolve_style(
        &doc,
        &["p { color: red }", "p { color: blue", "p { margin: 2px }"],
        "p",
    );
    assert_eq!(style.css("color"), "red");
    assert_eq!(style.css("margin"), "2px");

    let only_broken = StyleEngine::new().resolve(&doc, &["p { color: blue"]);
    assert!(only_broken.is_ok());
}

#[test]
fn test_bad_selector_does_not_drop_rule() {
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let style = resolve_style(&doc, &["p, li:nth-child(x) { color: red }"], "p");
    assert_eq!(style.css("color"), "red");
}

#[test]
fn test_add_on_stylesheet_can_be_disabled() {
    let doc = page(vec![SourceNode::element("a", vec![])]);

    let tree = StyleEngine::new().resolve(&doc, &[] as &[&str]).unwrap();
    let a = tree.root().find_first_descendant("a").unwrap();
    assert_eq!(a.resolved_style().css("color"), "blue");
    assert_eq!(a.resolved_style().css("display"), "inline");

    let tree = StyleEngine::new()
        .with_add_on_stylesheet(false)
        .resolve(&doc, &[] as &[&str])
        .unwrap();
    let a = tree.root().find_first_descendant("a").unwrap();
    assert!(a.resolved_style().is_empty());
}

#[test]
fn test_document_without_element_has_no_root() {
    let doc = DomTree::new();
    let err = StyleEngine::new().resolve(&doc, &[] as &[&str]).unwrap_err();
    assert_eq!(err, marten_style::StyleError::MissingRoot);
    assert!(RenderTree::build(&doc, NodeId::ROOT, &NodeMap::new(), &CssParser, StyleEngine::new().context()).is_err());
}

#[test]
fn test_resolve_starts_a_fresh_warning_run() {
    use marten_common::warning::{warn_once, was_warned};

    warn_once("CSS", "left over from an earlier document");
    let doc = page(vec![SourceNode::element("p", vec![])]);
    let _tree = StyleEngine::new().resolve(&doc, &["p { color: red }"]).unwrap();
    assert!(!was_warned("CSS", "left over from an earlier document"));
}
