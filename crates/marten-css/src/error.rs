//! Error types for stylesheet parsing and selector compilation.

use strum_macros::Display;
use thiserror::Error;

/// What went wrong while parsing a stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ParseErrorKind {
    /// A `{` block was still open at end of input.
    #[strum(to_string = "unclosed block")]
    UnclosedBlock,
    /// A `}` appeared with no block to close.
    #[strum(to_string = "unexpected '}}'")]
    UnexpectedCloseBrace,
    /// A quoted string ran into a newline or end of input.
    #[strum(to_string = "unterminated string")]
    UnterminatedString,
    /// A `/*` comment was never closed.
    #[strum(to_string = "unterminated comment")]
    UnterminatedComment,
    /// A qualified rule prelude ended without a `{` block.
    #[strum(to_string = "rule without a declaration block")]
    MissingBlock,
    /// An `@` was not followed by an identifier.
    #[strum(to_string = "at-rule without a name")]
    MissingAtRuleName,
}

/// [§ 2.2 Error handling](https://www.w3.org/TR/css-syntax-3/#error-handling)
///
/// A stylesheet that cannot be parsed at all. The caller decides whether to
/// drop the sheet and continue with the others.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("css parse error at {line}:{column}: {kind}")]
pub struct ParseError {
    /// Line of the offending character, starting at 1.
    pub line: usize,
    /// Column of the offending character in characters, starting at 1.
    pub column: usize,
    /// The kind of failure.
    pub kind: ParseErrorKind,
}

/// A selector the engine could not compile. Only the owning rule is skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector text was empty or whitespace.
    #[error("empty selector")]
    Empty,
    /// The selector uses syntax the engine does not understand.
    #[error("unsupported selector '{selector}': {reason}")]
    Unsupported {
        /// The raw selector text.
        selector: String,
        /// Short description of the offending construct.
        reason: String,
    },
}

impl SelectorError {
    pub(crate) fn unsupported(selector: &str, reason: impl Into<String>) -> Self {
        Self::Unsupported {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
