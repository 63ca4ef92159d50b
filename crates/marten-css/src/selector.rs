//! CSS Selector parsing and matching
//!
//! This module implements the subset of
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/) needed to apply
//! stylesheet rules to a static document: type, class, id, universal and
//! attribute selectors, structural pseudo-classes, and the four combinators.
//!
//! Selector specificity is not computed. Rules are applied in document order.

use std::str::FromStr;

use marten_dom::{DomTree, ElementData, NodeId, NodeType};

use crate::error::SelectorError;

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector is the name of a document language element type"
    ///
    /// Stored lowercased. Examples: `div`, `p`, `h1`
    Type(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Examples: `.highlight`, `.nav-item`
    Class(String),

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    ///
    /// Examples: `#main`, `#a\.b` (escaped full stop)
    Id(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// Pseudo-class or pseudo-element that never matches a static document,
    /// such as `:hover` or `::before`. Keeps the rest of the rule parseable.
    NeverMatch,

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    PseudoClass(PseudoClass),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
}

/// Structural pseudo-classes per [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    Root,
    /// [§ 14.4.1 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [§ 14.4.2 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [§ 14.4.3 :only-child](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,
    /// [§ 14.5.1 :first-of-type](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [§ 14.5.2 :last-of-type](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    Empty,
    /// [§ 8.2 :link](https://www.w3.org/TR/selectors-4/#the-link-pseudo)
    ///
    /// All links are unvisited in a static document.
    Link,
    /// `:disabled` (element carries the `disabled` attribute)
    Disabled,
    /// `:enabled` (element lacks the `disabled` attribute)
    Enabled,
    /// `:checked` (element carries the `checked` attribute)
    Checked,
    /// [§ 14.4.4 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    ///
    /// "The :nth-child(An+B) pseudo-class notation represents elements that are
    /// among An+Bth elements from the list composed of their inclusive siblings"
    NthChild {
        /// The `A` step.
        a: i64,
        /// The `B` offset.
        b: i64,
    },
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(String),
    /// `[attr=value]`
    Equals(String, String),
    /// `[attr~=value]` whitespace-separated word match
    Includes(String, String),
    /// `[attr|=value]` exact or followed by `-`
    DashMatch(String, String),
    /// `[attr^=value]`
    PrefixMatch(String, String),
    /// `[attr$=value]`
    SuffixMatch(String, String),
    /// `[attr*=value]`
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B`: B is an arbitrary descendant of A.
    Descendant,
    /// `A > B`: B is a direct child of A.
    Child,
    /// `A + B`: B immediately follows A.
    NextSibling,
    /// `A ~ B`: B follows A, not necessarily immediately.
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// A compiled selector. `div > ul li` is stored as
/// ```text
/// subject: [li]  combinators: [(Descendant, [ul]), (Child, [div])]
/// ```
/// so matching can run from the subject outward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The rightmost compound selector.
    pub subject: CompoundSelector,
    /// (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

impl Selector {
    /// Compile a single selector (no commas).
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for empty input or syntax outside the
    /// supported subset.
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        SelectorParser::new(raw).parse()
    }

    /// [§ 4.1 Selector Matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
    ///
    /// Match this selector against `node_id` with full tree context.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node_id: NodeId) -> bool {
        if !compound_matches(&self.subject, tree, node_id) {
            return false;
        }

        let mut current = node_id;
        for (combinator, compound) in &self.combinators {
            let next = match combinator {
                Combinator::Descendant => tree
                    .ancestors(current)
                    .find(|&id| compound_matches(compound, tree, id)),
                Combinator::Child => tree
                    .parent(current)
                    .filter(|&id| compound_matches(compound, tree, id)),
                Combinator::NextSibling => tree
                    .preceding_siblings(current)
                    .find(|&id| tree.as_element(id).is_some())
                    .filter(|&id| compound_matches(compound, tree, id)),
                Combinator::SubsequentSibling => tree
                    .preceding_siblings(current)
                    .find(|&id| compound_matches(compound, tree, id)),
            };
            match next {
                Some(id) => current = id,
                None => return false,
            }
        }
        true
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// All elements of `tree` matching `selector`, in document order.
#[must_use]
pub fn query_all(tree: &DomTree, selector: &Selector) -> Vec<NodeId> {
    tree.descendants_inclusive(NodeId::ROOT)
        .into_iter()
        .filter(|&id| selector.matches(tree, id))
        .collect()
}

fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node_id, element),
        _ => simple.matches(element),
    })
}

fn element_siblings(tree: &DomTree, node_id: NodeId) -> Vec<NodeId> {
    tree.parent(node_id)
        .map(|parent| {
            tree.children(parent)
                .iter()
                .copied()
                .filter(|&c| tree.as_element(c).is_some())
                .collect()
        })
        .unwrap_or_default()
}

fn pseudo_class_matches(pc: PseudoClass, tree: &DomTree, node_id: NodeId, element: &ElementData) -> bool {
    let same_type = |id: &NodeId| {
        tree.as_element(*id)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };

    match pc {
        PseudoClass::Root => tree.document_element() == Some(node_id),
        PseudoClass::FirstChild => element_siblings(tree, node_id).first() == Some(&node_id),
        PseudoClass::LastChild => element_siblings(tree, node_id).last() == Some(&node_id),
        PseudoClass::OnlyChild => element_siblings(tree, node_id) == [node_id],
        PseudoClass::FirstOfType => {
            element_siblings(tree, node_id).into_iter().find(|id| same_type(id)) == Some(node_id)
        }
        PseudoClass::LastOfType => {
            element_siblings(tree, node_id).into_iter().rfind(|id| same_type(id)) == Some(node_id)
        }
        // "only element nodes and content nodes (such as DOM text nodes, CDATA
        // nodes, and entity references) whose data has a non-zero length must
        // be considered as affecting emptiness"
        PseudoClass::Empty => tree
            .children(node_id)
            .iter()
            .all(|&c| match tree.get(c).map(|n| &n.node_type) {
                Some(NodeType::Text(t)) => t.is_empty(),
                Some(NodeType::Comment(_)) => true,
                _ => false,
            }),
        PseudoClass::Link => {
            (element.tag_name.eq_ignore_ascii_case("a") || element.tag_name.eq_ignore_ascii_case("area"))
                && element.has_attr("href")
        }
        PseudoClass::Disabled => element.has_attr("disabled"),
        PseudoClass::Enabled => !element.has_attr("disabled"),
        PseudoClass::Checked => element.has_attr("checked"),
        PseudoClass::NthChild { a, b } => {
            let Some(index) = element_siblings(tree, node_id).iter().position(|&id| id == node_id) else {
                return false;
            };
            let position = i64::try_from(index).unwrap_or(i64::MAX - 1) + 1;
            nth_matches(a, b, position)
        }
    }
}

/// Does 1-based `position` equal `a*n + b` for some `n >= 0`?
const fn nth_matches(a: i64, b: i64, position: i64) -> bool {
    if a == 0 {
        return position == b;
    }
    let diff = position - b;
    diff % a == 0 && diff / a >= 0
}

impl SimpleSelector {
    /// Check if this simple selector matches the element on its own.
    ///
    /// Structural pseudo-classes need tree context and never match here.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Class(class_name) => element.classes().any(|c| c == class_name),
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Universal => true,
            Self::NeverMatch | Self::PseudoClass(_) => false,
            Self::Attribute(attr_sel) => match attr_sel {
                AttributeSelector::Exists(name) => element.has_attr(name),
                AttributeSelector::Equals(name, val) => element.attr(name) == Some(val.as_str()),
                AttributeSelector::Includes(name, val) => element
                    .attr(name)
                    .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
                AttributeSelector::DashMatch(name, val) => element.attr(name).is_some_and(|v| {
                    v == val || v.strip_prefix(val.as_str()).is_some_and(|rest| rest.starts_with('-'))
                }),
                AttributeSelector::PrefixMatch(name, val) => {
                    !val.is_empty() && element.attr(name).is_some_and(|v| v.starts_with(val.as_str()))
                }
                AttributeSelector::SuffixMatch(name, val) => {
                    !val.is_empty() && element.attr(name).is_some_and(|v| v.ends_with(val.as_str()))
                }
                AttributeSelector::SubstringMatch(name, val) => {
                    !val.is_empty() && element.attr(name).is_some_and(|v| v.contains(val.as_str()))
                }
            },
        }
    }
}

/// [§ 4.3.9 ident code point](https://www.w3.org/TR/css-syntax-3/#ident-code-point)
const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Character cursor over one selector.
struct SelectorParser<'a> {
    raw: &'a str,
    chars: Vec<char>,
    position: usize,
}

impl<'a> SelectorParser<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            chars: raw.trim().chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    fn unsupported(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::unsupported(self.raw, reason)
    }

    /// Skip whitespace, returning whether any was present.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.position;
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
        self.position > start
    }

    /// [§ 4.3.11 Consume an ident sequence](https://www.w3.org/TR/css-syntax-3/#consume-name)
    ///
    /// Handles `\` escapes, including hex escapes such as `\31 `.
    fn consume_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.position += 1;
                ident.push(self.consume_escape());
            } else if is_ident_char(c) {
                self.position += 1;
                ident.push(c);
            } else {
                break;
            }
        }
        ident
    }

    /// [§ 4.3.7 Consume an escaped code point](https://www.w3.org/TR/css-syntax-3/#consume-escaped-code-point)
    fn consume_escape(&mut self) -> char {
        let mut hex = String::new();
        while hex.len() < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            hex.push(self.bump().unwrap_or('0'));
        }
        if hex.is_empty() {
            return self.bump().unwrap_or(char::REPLACEMENT_CHARACTER);
        }
        // "If the next input code point is whitespace, consume it as well."
        if self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|&c| c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Parse the whole selector.
    ///
    /// Compounds are collected left to right and then reversed so the subject
    /// comes first.
    fn parse(mut self) -> Result<Selector, SelectorError> {
        if self.chars.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.unsupported(format!("unexpected '{c}'"))),
            };
            if combinator != Combinator::Descendant {
                self.position += 1;
                let _ = self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        let mut compounds = compounds.into_iter().rev();
        let subject = compounds.next().ok_or(SelectorError::Empty)?;
        Ok(Selector {
            subject,
            combinators: combinators.into_iter().rev().zip(compounds).collect(),
        })
    }

    /// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
    fn parse_compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut simple_selectors = Vec::new();

        while let Some(c) = self.peek() {
            let simple = match c {
                '*' => {
                    self.position += 1;
                    SimpleSelector::Universal
                }
                '.' => {
                    self.position += 1;
                    let name = self.consume_ident();
                    if name.is_empty() {
                        return Err(self.unsupported("empty class name"));
                    }
                    SimpleSelector::Class(name)
                }
                '#' => {
                    self.position += 1;
                    let name = self.consume_ident();
                    if name.is_empty() {
                        return Err(self.unsupported("empty id"));
                    }
                    SimpleSelector::Id(name)
                }
                '[' => {
                    self.position += 1;
                    SimpleSelector::Attribute(self.parse_attribute()?)
                }
                ':' => {
                    self.position += 1;
                    self.parse_pseudo()?
                }
                c if is_ident_char(c) || c == '\\' => {
                    if !simple_selectors.is_empty() {
                        return Err(self.unsupported("type selector must come first"));
                    }
                    SimpleSelector::Type(self.consume_ident().to_ascii_lowercase())
                }
                _ => break,
            };
            simple_selectors.push(simple);
        }

        if simple_selectors.is_empty() {
            return Err(match self.peek() {
                Some(c) => self.unsupported(format!("unexpected '{c}'")),
                None => self.unsupported("dangling combinator"),
            });
        }
        Ok(CompoundSelector { simple_selectors })
    }

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    ///
    /// Called after the opening `[`.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        let _ = self.skip_whitespace();
        let name = self.consume_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unsupported("empty attribute name"));
        }
        let _ = self.skip_whitespace();

        let operator = match self.bump() {
            Some(']') => return Ok(AttributeSelector::Exists(name)),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) if self.peek() == Some('=') => {
                self.position += 1;
                op
            }
            _ => return Err(self.unsupported("malformed attribute selector")),
        };

        let _ = self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.position += 1;
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some('\\') => value.push(self.consume_escape()),
                        Some(c) => value.push(c),
                        None => return Err(self.unsupported("unterminated attribute value")),
                    }
                }
                value
            }
            _ => self.consume_ident(),
        };

        let _ = self.skip_whitespace();
        // Case-sensitivity flags are accepted and ignored.
        if self.peek().is_some_and(|c| c.eq_ignore_ascii_case(&'i') || c.eq_ignore_ascii_case(&'s')) {
            self.position += 1;
            let _ = self.skip_whitespace();
        }
        if self.bump() != Some(']') {
            return Err(self.unsupported("unterminated attribute selector"));
        }

        Ok(match operator {
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            '*' => AttributeSelector::SubstringMatch(name, value),
            _ => AttributeSelector::Equals(name, value),
        })
    }

    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
    /// [§ 11 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    ///
    /// Called after the first `:`.
    fn parse_pseudo(&mut self) -> Result<SimpleSelector, SelectorError> {
        let is_pseudo_element = self.peek() == Some(':');
        if is_pseudo_element {
            self.position += 1;
        }

        let name = self.consume_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unsupported("empty pseudo-class"));
        }

        let argument = if self.peek() == Some('(') {
            self.position += 1;
            let mut depth = 1u32;
            let mut argument = String::new();
            loop {
                match self.bump() {
                    Some('(') => depth += 1,
                    Some(')') => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    None => return Err(self.unsupported("unbalanced parentheses")),
                    Some(_) => {}
                }
                if let Some(c) = self.chars.get(self.position - 1) {
                    argument.push(*c);
                }
            }
            Some(argument)
        } else {
            None
        };

        if is_pseudo_element {
            return Ok(SimpleSelector::NeverMatch);
        }

        let pseudo = match (name.as_str(), argument.as_deref()) {
            ("root", None) => PseudoClass::Root,
            ("first-child", None) => PseudoClass::FirstChild,
            ("last-child", None) => PseudoClass::LastChild,
            ("only-child", None) => PseudoClass::OnlyChild,
            ("first-of-type", None) => PseudoClass::FirstOfType,
            ("last-of-type", None) => PseudoClass::LastOfType,
            ("empty", None) => PseudoClass::Empty,
            ("link" | "any-link", None) => PseudoClass::Link,
            ("disabled", None) => PseudoClass::Disabled,
            ("enabled", None) => PseudoClass::Enabled,
            ("checked", None) => PseudoClass::Checked,
            ("nth-child", Some(argument)) => {
                let (a, b) = parse_an_plus_b(argument)
                    .ok_or_else(|| self.unsupported(format!("bad :nth-child argument '{argument}'")))?;
                PseudoClass::NthChild { a, b }
            }
            // Interactive states, legacy pseudo-elements and functional
            // pseudo-classes other than :nth-child.
            _ => return Ok(SimpleSelector::NeverMatch),
        };
        Ok(SimpleSelector::PseudoClass(pseudo))
    }
}

/// [§ 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
fn parse_an_plus_b(argument: &str) -> Option<(i64, i64)> {
    let compact: String = argument
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "odd" => return Some((2, 1)),
        "even" => return Some((2, 0)),
        _ => {}
    }

    let Some(n_at) = compact.find('n') else {
        return compact.parse().ok().map(|b| (0, b));
    };

    let a = match &compact[..n_at] {
        "" | "+" => 1,
        "-" => -1,
        digits => digits.parse().ok()?,
    };
    let rest = &compact[n_at + 1..];
    let b = if rest.is_empty() {
        0
    } else if rest.starts_with('+') || rest.starts_with('-') {
        rest.parse().ok()?
    } else {
        return None;
    };
    Some((a, b))
}
