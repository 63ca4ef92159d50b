//! Stylesheet parsing and selector matching for the Marten style resolver.
//!
//! These are the collaborators the cascade consumes through the
//! [`StylesheetParser`] and [`SelectorEngine`] traits:
//!
//! - [`parser`]: CSS text to [`Stylesheet`] rules, `style` attribute bodies to
//!   [`Declaration`] lists, and `@import` preprocessing.
//! - [`selector`]: selector compilation and matching against a
//!   [`marten_dom::DomTree`].
//! - [`ua_stylesheet`]: the add-on user-agent sheet.
//! - [`sources`]: where a document's stylesheets come from.

/// Collaborator traits and their built-in implementations.
pub mod engine;
/// Parse and selector errors.
pub mod error;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// Selector parsing and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// `<style>` and `<link rel="stylesheet">` discovery.
pub mod sources;
/// User-agent add-on stylesheet.
pub mod ua_stylesheet;

pub use engine::{CssParser, SelectorEngine, SelectorMatcher, StylesheetParser};
pub use error::{ParseError, ParseErrorKind, SelectorError};
pub use parser::{
    Declaration, Import, Preprocessed, Rule, Stylesheet, parse_declarations, parse_stylesheet,
    preprocess,
};
pub use selector::{Selector, query_all};
pub use sources::{extract_style_content, stylesheet_hrefs};
pub use ua_stylesheet::{ADD_ON_CSS, add_on_stylesheet};
