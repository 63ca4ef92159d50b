//! CSS Cascading
//!
//! [CSS Cascading and Inheritance Level 4](https://www.w3.org/TR/css-cascade-4/)
//!
//! A node's style is built in three layers, each overriding the one before:
//!
//! 1. inherited properties of the parent's resolved style
//! 2. declarations from matching stylesheet rules
//! 3. declarations from the `style` attribute and presentational attributes
//!
//! Selector specificity is not used. Among stylesheet rules the last match
//! wins, except that an `!important` declaration is never replaced by a later
//! rule, important or not. This differs from standard CSS, where a later
//! important declaration would win.

use std::collections::BTreeMap;

use marten_common::warning::warn_once;
use marten_css::{Declaration, Rule, StylesheetParser};
use marten_dom::{ElementData, NodeId};

use crate::declaration::StyleMap;
use crate::matcher::NodeRules;

/// Per-node collapsed stylesheet declarations.
pub type NodeMap = BTreeMap<NodeId, StyleMap>;

/// [CSS 2.1 Appendix F. Full property table](https://www.w3.org/TR/CSS21/propidx.html)
///
/// Properties whose "Inherited?" column reads "yes".
pub const INHERITED_PROPERTIES: &[&str] = &[
    "azimuth",
    "border-collapse",
    "border-spacing",
    "caption-side",
    "color",
    "cursor",
    "direction",
    "elevation",
    "empty-cells",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "font",
    "letter-spacing",
    "line-height",
    "list-style-image",
    "list-style-position",
    "list-style-type",
    "list-style",
    "orphans",
    "pitch-range",
    "pitch",
    "quotes",
    "richness",
    "speak-header",
    "speak-numeral",
    "speak-punctuation",
    "speak",
    "speech-rate",
    "stress",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "voice-family",
    "volume",
    "white-space",
    "widows",
    "word-spacing",
];

/// [§ 7.2 Inherited properties](https://www.w3.org/TR/css-cascade-4/#inherited-property)
#[must_use]
pub fn is_inherited(property: &str) -> bool {
    INHERITED_PROPERTIES.contains(&property)
}

/// Layer `child` over `base`.
///
/// With `copy_all` unset only inherited properties of `base` survive. Every
/// declaration of `child` is written, except values of `inherit`, which leave
/// the base value in place.
#[must_use]
pub fn apply_child_style(base: &StyleMap, child: &StyleMap, copy_all: bool) -> StyleMap {
    let mut result: StyleMap = base
        .iter()
        .filter(|declaration| copy_all || is_inherited(&declaration.property))
        .cloned()
        .collect();

    for declaration in child {
        if declaration.value == "inherit" {
            continue;
        }
        result.insert(declaration.clone());
    }
    result
}

/// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading)
///
/// Resolve one node's style from its parent's resolved style, the collapsed
/// declarations of its matching rules, and its inline declarations.
#[must_use]
pub fn resolve(parent: &StyleMap, matched: Option<&StyleMap>, inline: &StyleMap) -> StyleMap {
    // [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting)
    let mut style = apply_child_style(parent, &StyleMap::new(), false);

    if let Some(matched) = matched {
        style = apply_child_style(&style, matched, false);
    }

    // Inline declarations keep everything resolved so far.
    apply_child_style(&style, inline, true)
}

/// Collapse a node's matched rules into one map.
///
/// Later rules overwrite earlier ones unless the earlier declaration is
/// important.
#[must_use]
pub fn collapse_rules(rules: &[&Rule]) -> StyleMap {
    let mut collapsed = StyleMap::new();
    for declaration in rules.iter().flat_map(|rule| &rule.declarations) {
        if collapsed
            .get(&declaration.property)
            .is_some_and(|existing| existing.important)
        {
            continue;
        }
        collapsed.insert(declaration.clone());
    }
    collapsed
}

/// Collapse every node's matched rules.
#[must_use]
pub fn node_map(rules: &NodeRules<'_>) -> NodeMap {
    rules
        .iter()
        .map(|(&node, matched)| (node, collapse_rules(matched)))
        .collect()
}

/// Merge the node map of a later stylesheet into `into`.
///
/// Declarations of `add_on` overwrite those already present, whatever their
/// importance; `inherit` values are skipped.
pub fn merge_node_maps(into: &mut NodeMap, add_on: NodeMap) {
    for (node, style) in add_on {
        let entry = into.entry(node).or_default();
        *entry = apply_child_style(entry, &style, true);
    }
}

/// Declarations carried by an element's own attributes, in attribute order.
///
/// - `style`: parsed as a declaration list
/// - `width` / `height`: the value, with `px` appended unless it already ends
///   in `px` or `%`
/// - `bgcolor`: becomes `background-color`
///
/// An unparsable `style` attribute is logged and ignored.
#[must_use]
pub fn inline_declarations<P: StylesheetParser>(parser: &P, element: &ElementData) -> StyleMap {
    let mut style = StyleMap::new();

    for (key, value) in &element.attrs {
        match key.as_str() {
            "style" => {
                let mut text = value.trim().to_string();
                if !text.ends_with(';') {
                    text.push(';');
                }
                match parser.parse_declarations(&text) {
                    Ok(declarations) => {
                        for declaration in declarations {
                            style.insert(declaration);
                        }
                    }
                    Err(err) => warn_once("CSS", &format!("could not parse '{value}': {err}")),
                }
            }
            "width" | "height" => {
                let mut length = value.clone();
                if !length.ends_with('%') && !length.ends_with("px") {
                    length.push_str("px");
                }
                style.insert(Declaration::new(key.as_str(), length, false));
            }
            "bgcolor" => style.insert(Declaration::new("background-color", value.as_str(), false)),
            _ => {}
        }
    }

    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(declarations: &[(&str, &str)]) -> StyleMap {
        declarations
            .iter()
            .map(|(p, v)| Declaration::new(*p, *v, false))
            .collect()
    }

    #[test]
    fn test_only_inherited_properties_pass_down() {
        let parent = map(&[("color", "red"), ("margin", "4px"), ("font-size", "12px")]);
        let style = resolve(&parent, None, &StyleMap::new());
        assert_eq!(style.value("color"), Some("red"));
        assert_eq!(style.value("font-size"), Some("12px"));
        assert_eq!(style.value("margin"), None);
    }

    #[test]
    fn test_inherit_keyword_is_skipped() {
        let parent = map(&[("color", "red")]);
        let matched = map(&[("color", "inherit"), ("display", "inherit")]);
        let style = resolve(&parent, Some(&matched), &StyleMap::new());
        assert_eq!(style.value("color"), Some("red"));
        assert!(!style.contains("display"));
    }

    #[test]
    fn test_matched_non_inherited_property_is_kept_under_inline() {
        let matched = map(&[("margin", "4px")]);
        let inline = map(&[("padding", "1px")]);
        let style = resolve(&StyleMap::new(), Some(&matched), &inline);
        assert_eq!(style.value("margin"), Some("4px"));
        assert_eq!(style.value("padding"), Some("1px"));
    }

    #[test]
    fn test_presentational_attributes() {
        let element = ElementData::new(
            "td",
            &[("width", "40"), ("height", "50%"), ("bgcolor", "#ff0000")],
        );
        let style = inline_declarations(&marten_css::CssParser, &element);
        assert_eq!(style.value("width"), Some("40px"));
        assert_eq!(style.value("height"), Some("50%"));
        assert_eq!(style.value("background-color"), Some("#ff0000"));
    }

    #[test]
    fn test_style_attribute_later_attribute_wins() {
        let element = ElementData::new("img", &[("width", "10"), ("style", "width: 20px")]);
        let style = inline_declarations(&marten_css::CssParser, &element);
        assert_eq!(style.value("width"), Some("20px"));
    }
}
