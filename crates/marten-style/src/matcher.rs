//! Rule matching
//!
//! Runs every rule of a stylesheet through the selector engine and records,
//! per document node, the rules that matched in stylesheet order. Media
//! blocks are expanded in place when their condition holds.
//!
//! [§ 2 Media Queries](https://www.w3.org/TR/mediaqueries-4/#media)
//!
//! Only a single `min-width` and a single `max-width` clause are honoured,
//! found by text search. `and`, `not` and comma-separated query lists are not
//! evaluated. Any condition mentioning `print` never applies.

use std::collections::BTreeMap;
use std::ptr;

use marten_common::warning::warn_once;
use marten_css::{Rule, SelectorEngine, Stylesheet};
use marten_dom::{DomTree, NodeId};

use crate::length::{Length, ResolutionContext};

/// Per-node matched rules, in match order.
pub type NodeRules<'s> = BTreeMap<NodeId, Vec<&'s Rule>>;

/// Match all rules of `sheet` against `doc`.
///
/// A selector that fails to compile is logged and skipped; the rest of its
/// rule still applies through its other selectors.
#[must_use]
pub fn match_rules<'s, E: SelectorEngine>(
    selectors: &E,
    doc: &DomTree,
    sheet: &'s Stylesheet,
    ctx: &ResolutionContext,
) -> NodeRules<'s> {
    let mut matched = NodeRules::new();
    for rule in &sheet.rules {
        process_rule(selectors, doc, rule, ctx, &mut matched);
    }
    log::debug!(
        target: "marten",
        "matched {} rules against {} nodes",
        sheet.rules.len(),
        matched.len()
    );
    matched
}

fn process_rule<'s, E: SelectorEngine>(
    selectors: &E,
    doc: &DomTree,
    rule: &'s Rule,
    ctx: &ResolutionContext,
    matched: &mut NodeRules<'s>,
) {
    for selector in &rule.selectors {
        let compiled = match selectors.compile(selector) {
            Ok(compiled) => compiled,
            Err(err) => {
                warn_once("CSS", &format!("cssSel compile {selector}: {err}"));
                continue;
            }
        };
        for node in selectors.query_all(&compiled, doc) {
            let rules = matched.entry(node).or_default();
            // A rule listed under several matching selectors counts once.
            if !rules.last().is_some_and(|last| ptr::eq(*last, rule)) {
                rules.push(rule);
            }
        }
    }

    if rule.nested_rules.is_empty() || !media_applies(&rule.prelude, ctx) {
        return;
    }
    // Keyframe selectors (`from`, `50%`) are not element selectors.
    if rule.name.as_deref().is_some_and(|name| name.ends_with("keyframes")) {
        return;
    }
    for nested in &rule.nested_rules {
        process_rule(selectors, doc, nested, ctx, matched);
    }
}

/// Does an at-rule condition hold for the current viewport?
#[must_use]
pub fn media_applies(prelude: &str, ctx: &ResolutionContext) -> bool {
    if prelude.contains("print") {
        return false;
    }
    let viewport_width = ctx.viewport.width;
    if width_clause(prelude, "max-width", ctx).is_some_and(|max| viewport_width > max) {
        return false;
    }
    if width_clause(prelude, "min-width", ctx).is_some_and(|min| viewport_width < min) {
        return false;
    }
    true
}

/// Pixel value of the first `<feature>: <digits>(px|em|rem)` clause.
fn width_clause(prelude: &str, feature: &str, ctx: &ResolutionContext) -> Option<f64> {
    prelude.match_indices(feature).find_map(|(at, _)| {
        let rest = prelude[at + feature.len()..].strip_prefix(':')?.trim_start();
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        let unit = ["px", "em", "rem"]
            .into_iter()
            .find(|unit| rest[digits..].starts_with(unit))?;
        let length = Length::parse(&rest[..digits + unit.len()]).ok()?;
        Some(length.to_absolute(ctx))
    })
}
