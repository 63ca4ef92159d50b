//! Collaborator traits consumed by the style resolver.
//!
//! The resolver never calls the parser or the selector matcher directly. It
//! goes through [`StylesheetParser`] and [`SelectorEngine`] so either side can
//! be swapped for another implementation.

use marten_dom::{DomTree, NodeId};

use crate::error::{ParseError, SelectorError};
use crate::parser::{self, Declaration, Stylesheet};
use crate::selector::{self, Selector};

/// CSS text to rules.
pub trait StylesheetParser {
    /// Parse a full stylesheet.
    ///
    /// # Errors
    ///
    /// Fails with a [`ParseError`] on malformed input.
    fn parse_stylesheet(&self, text: &str) -> Result<Stylesheet, ParseError>;

    /// Parse the body of a `style` attribute.
    ///
    /// # Errors
    ///
    /// Fails with a [`ParseError`] on malformed input.
    fn parse_declarations(&self, text: &str) -> Result<Vec<Declaration>, ParseError>;
}

/// Selector text to matching nodes.
pub trait SelectorEngine {
    /// A compiled selector.
    type Compiled;

    /// Compile one selector (no commas).
    ///
    /// # Errors
    ///
    /// Fails with a [`SelectorError`] if the selector cannot be compiled.
    fn compile(&self, selector: &str) -> Result<Self::Compiled, SelectorError>;

    /// Nodes of `tree` matched by `compiled`, in document order.
    fn query_all(&self, compiled: &Self::Compiled, tree: &DomTree) -> Vec<NodeId>;
}

/// The built-in parser from [`crate::parser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CssParser;

impl StylesheetParser for CssParser {
    fn parse_stylesheet(&self, text: &str) -> Result<Stylesheet, ParseError> {
        parser::parse_stylesheet(text)
    }

    fn parse_declarations(&self, text: &str) -> Result<Vec<Declaration>, ParseError> {
        parser::parse_declarations(text)
    }
}

/// The built-in matcher from [`crate::selector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorMatcher;

impl SelectorEngine for SelectorMatcher {
    type Compiled = Selector;

    fn compile(&self, selector: &str) -> Result<Selector, SelectorError> {
        Selector::parse(selector)
    }

    fn query_all(&self, compiled: &Selector, tree: &DomTree) -> Vec<NodeId> {
        selector::query_all(tree, compiled)
    }
}
