//! Error types for style resolution.

use thiserror::Error;

/// A property value that could not be interpreted.
///
/// Queries that hit one of these substitute their documented default
/// (`0px`, opaque black, the base font size) and log the failure once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A length with a suffix outside `px`, `%`, `rem`, `em`, `vw`, `vh`.
    #[error("unknown unit in '{0}'")]
    UnknownUnit(String),
    /// The numeric part of a length did not parse.
    #[error("malformed number in '{0}'")]
    InvalidNumber(String),
    /// A color value that is not `rgb()`, hex, or a named color.
    #[error("could not interpret color '{0}'")]
    InvalidColor(String),
}

/// Failure of a whole resolution run.
///
/// A stylesheet that fails to parse is not one: it is skipped with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleError {
    /// The document has no node a render tree could be rooted at.
    #[error("document has no element to build a render tree from")]
    MissingRoot,
}
