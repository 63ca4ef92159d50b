//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! The parser works directly on characters instead of a separate token stream.
//! Component values are kept as normalized text (whitespace collapsed, comments
//! dropped) because the resolver only ever needs declaration values as strings.
//!
//! Unlike the error-recovering parse the CSS Syntax module describes, structural
//! damage (unbalanced braces, unterminated strings or comments) fails the whole
//! sheet with a [`ParseError`]. Malformed declarations inside a well-formed
//! block are still dropped individually.

use marten_common::warning::warn_once;
use serde::Serialize;

use crate::error::{ParseError, ParseErrorKind};

/// At-rules whose block holds declarations rather than nested rules.
const DECLARATION_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "viewport",
    "counter-style",
    "font-feature-values",
    "property",
];

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A CSS declaration (e.g., `color: red`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    /// The property name, ASCII-lowercased unless it is a custom property.
    pub property: String,
    /// The value text with `!important` removed.
    pub value: String,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

impl Declaration {
    /// Create a declaration from its parts.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

/// A rule from a stylesheet.
///
/// Qualified (style) rules carry `selectors` and `declarations`. At-rules carry
/// their `name`, the raw condition text in `prelude`, and for block at-rules
/// such as `@media` the rules of the block in `nested_rules`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// At-rule name without the `@`, lowercased. `None` for style rules.
    pub name: Option<String>,
    /// Raw prelude text of an at-rule, e.g. `screen and (max-width: 600px)`.
    pub prelude: String,
    /// Comma-separated selector list of a style rule, split and trimmed.
    pub selectors: Vec<String>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Rules inside an at-rule block.
    pub nested_rules: Vec<Rule>,
}

impl Rule {
    /// True for `@name ...` rules.
    #[must_use]
    pub const fn is_at_rule(&self) -> bool {
        self.name.is_some()
    }
}

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
///
/// A parsed CSS stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stylesheet {
    /// The list of rules in the stylesheet.
    pub rules: Vec<Rule>,
}

/// One `@import` found by [`preprocess`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The imported URL as written.
    pub url: String,
    /// Media query list following the URL, possibly empty.
    pub media: String,
}

/// Result of [`preprocess`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    /// Imports in the order they appear.
    pub imports: Vec<Import>,
    /// The stylesheet text after the leading `@charset` and `@import` rules.
    pub css: String,
}

/// Parse a complete stylesheet.
///
/// `@charset` and `@import` statements are dropped; use [`preprocess`] to
/// collect imports before parsing.
///
/// # Errors
///
/// Returns a [`ParseError`] for unbalanced braces, unterminated strings or
/// comments, and style rules without a block.
pub fn parse_stylesheet(text: &str) -> Result<Stylesheet, ParseError> {
    let mut parser = Parser::new(text);
    let rules = parser
        .consume_list_of_rules(true)?
        .into_iter()
        .filter(|rule| !matches!(rule.name.as_deref(), Some("charset" | "import")))
        .collect::<Vec<_>>();
    log::debug!(target: "marten", "parsed stylesheet: {} top-level rules", rules.len());
    Ok(Stylesheet { rules })
}

/// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
///
/// Parse declarations from a `style` attribute or similar. A trailing `;`
/// is optional.
///
/// # Errors
///
/// Returns a [`ParseError`] for a stray `}` or an unterminated string or comment.
pub fn parse_declarations(text: &str) -> Result<Vec<Declaration>, ParseError> {
    Parser::new(text).consume_list_of_declarations(false)
}

/// Split leading `@charset` and `@import` rules off a stylesheet.
///
/// [§ 6 Importing style sheets](https://www.w3.org/TR/css-cascade-4/#at-import)
/// "Any @import rules must precede all other valid at-rules and style rules in
/// a style sheet (ignoring @charset and @layer statement rules)"
///
/// # Errors
///
/// Returns a [`ParseError`] if a leading at-rule is structurally broken.
pub fn preprocess(text: &str) -> Result<Preprocessed, ParseError> {
    let mut parser = Parser::new(text);
    let mut imports = Vec::new();

    loop {
        parser.skip_whitespace_and_comments()?;
        let is_import = parser.starts_with_ignore_case("@import");
        if !is_import && !parser.starts_with_ignore_case("@charset") {
            break;
        }
        let Some(rule) = parser.consume_at_rule()? else {
            break;
        };
        if is_import && let Some(import) = parse_import_prelude(&rule.prelude) {
            imports.push(import);
        }
    }

    Ok(Preprocessed {
        imports,
        css: parser.remaining(),
    })
}

/// Character-level CSS parser.
struct Parser {
    input: Vec<char>,
    position: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += 1;
        Some(c)
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.starts_with_by(pattern, |c, expected| c == expected)
    }

    fn starts_with_ignore_case(&self, pattern: &str) -> bool {
        self.starts_with_by(pattern, |c, expected| c.eq_ignore_ascii_case(&expected))
    }

    fn starts_with_by(&self, pattern: &str, same: impl Fn(char, char) -> bool) -> bool {
        let rest = &self.input[self.position.min(self.input.len())..];
        pattern.chars().count() <= rest.len()
            && rest.iter().zip(pattern.chars()).all(|(&c, expected)| same(c, expected))
    }

    fn remaining(&self) -> String {
        self.input[self.position.min(self.input.len())..].iter().collect()
    }

    /// Build an error located at `position`.
    fn error_at(&self, position: usize, kind: ParseErrorKind) -> ParseError {
        let mut line = 1;
        let mut column = 1;
        for &c in &self.input[..position.min(self.input.len())] {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        ParseError { line, column, kind }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(self.position, kind)
    }

    /// [§ 4.3.2 Consume comments](https://www.w3.org/TR/css-syntax-3/#consume-comments)
    fn skip_comment(&mut self) -> Result<(), ParseError> {
        let start = self.position;
        self.position += 2;
        while self.position < self.input.len() {
            if self.starts_with("*/") {
                self.position += 2;
                return Ok(());
            }
            self.position += 1;
        }
        Err(self.error_at(start, ParseErrorKind::UnterminatedComment))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.position += 1,
                Some('/') if self.starts_with("/*") => self.skip_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// [§ 4.3.5 Consume a string token](https://www.w3.org/TR/css-syntax-3/#consume-string-token)
    ///
    /// Copies the quoted string, quotes included, into `out`.
    fn consume_string(&mut self, out: &mut String) -> Result<(), ParseError> {
        let start = self.position;
        let Some(quote) = self.consume() else {
            return Ok(());
        };
        out.push(quote);
        loop {
            match self.consume() {
                Some(c) if c == quote => {
                    out.push(c);
                    return Ok(());
                }
                Some('\\') => {
                    out.push('\\');
                    if let Some(escaped) = self.consume() {
                        out.push(escaped);
                    }
                }
                // "newline: This is a parse error."
                None | Some('\n') => {
                    return Err(self.error_at(start, ParseErrorKind::UnterminatedString));
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Consume component values as text until `stop` matches a character
    /// outside any `()`, `[]` or `{}` nesting. The stop character is left
    /// unconsumed. A `}` at nesting depth zero always stops.
    ///
    /// Whitespace runs and comments collapse to a single space and the result
    /// is trimmed.
    fn consume_component_text(&mut self, stop: impl Fn(char) -> bool) -> Result<String, ParseError> {
        let mut out = String::new();
        let mut depth = 0usize;
        let mut pending_space = false;

        while let Some(c) = self.peek() {
            if depth == 0 && (c == '}' || stop(c)) {
                break;
            }
            if c.is_whitespace() {
                pending_space = true;
                self.position += 1;
                continue;
            }
            if self.starts_with("/*") {
                self.skip_comment()?;
                pending_space = true;
                continue;
            }
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;

            match c {
                '"' | '\'' => self.consume_string(&mut out)?,
                '\\' => {
                    self.position += 1;
                    out.push('\\');
                    if let Some(escaped) = self.consume() {
                        out.push(escaped);
                    }
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    self.position += 1;
                    out.push(c);
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    self.position += 1;
                    out.push(c);
                }
                _ => {
                    self.position += 1;
                    out.push(c);
                }
            }
        }

        if depth > 0 {
            return Err(self.error(ParseErrorKind::UnclosedBlock));
        }
        Ok(out)
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    ///
    /// A nested list stops in front of its closing `}`.
    fn consume_list_of_rules(&mut self, top_level: bool) -> Result<Vec<Rule>, ParseError> {
        // "Create an initially empty list of rules."
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                // "<EOF-token>"
                // "Return the list of rules."
                None if top_level => return Ok(rules),
                None => return Err(self.error(ParseErrorKind::UnclosedBlock)),

                Some('}') if top_level => {
                    return Err(self.error(ParseErrorKind::UnexpectedCloseBrace));
                }
                Some('}') => return Ok(rules),

                // "<CDO-token>" or "<CDC-token>"
                // "If the top-level flag is set, do nothing."
                Some('<') if top_level && self.starts_with("<!--") => self.position += 4,
                Some('-') if top_level && self.starts_with("-->") => self.position += 3,

                // "<at-keyword-token>"
                // "Consume an at-rule, and append the returned value to the list of rules."
                Some('@') => {
                    if let Some(rule) = self.consume_at_rule()? {
                        rules.push(rule);
                    }
                }

                // "anything else"
                // "Consume a qualified rule."
                Some(_) => rules.push(self.consume_qualified_rule()?),
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Result<Option<Rule>, ParseError> {
        let start = self.position;
        let _ = self.consume(); // @

        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                name.push(c.to_ascii_lowercase());
                self.position += 1;
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(self.error_at(start, ParseErrorKind::MissingAtRuleName));
        }

        let prelude = self.consume_component_text(|c| c == '{' || c == ';')?;
        let mut rule = Rule {
            name: Some(name),
            prelude,
            ..Rule::default()
        };

        match self.peek() {
            // "<semicolon-token>"
            // "Return the at-rule."
            Some(';') => {
                self.position += 1;
            }
            // "<{-token>"
            // "Consume a simple block and assign it to the at-rule's block."
            Some('{') => {
                self.position += 1;
                let holds_declarations = rule
                    .name
                    .as_deref()
                    .is_some_and(|name| DECLARATION_AT_RULES.contains(&name));
                if holds_declarations {
                    rule.declarations = self.consume_list_of_declarations(true)?;
                } else {
                    rule.nested_rules = self.consume_list_of_rules(false)?;
                }
                let _ = self.consume(); // }
            }
            // "<EOF-token>"
            // "This is a parse error. Return the at-rule."
            _ => {}
        }

        Ok(Some(rule))
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Result<Rule, ParseError> {
        let prelude = self.consume_component_text(|c| c == '{')?;

        if self.peek() != Some('{') {
            // "<EOF-token>"
            // "This is a parse error. Return nothing."
            return Err(self.error(ParseErrorKind::MissingBlock));
        }
        self.position += 1;

        let declarations = self.consume_list_of_declarations(true)?;
        let _ = self.consume(); // }

        Ok(Rule {
            selectors: split_selector_list(&prelude),
            declarations,
            ..Rule::default()
        })
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    ///
    /// Inside a block the list stops in front of the closing `}`.
    fn consume_list_of_declarations(&mut self, in_block: bool) -> Result<Vec<Declaration>, ParseError> {
        let mut declarations = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            match self.peek() {
                // "<EOF-token>"
                // "Return the list of declarations."
                None if in_block => return Err(self.error(ParseErrorKind::UnclosedBlock)),
                None => return Ok(declarations),

                Some('}') if in_block => return Ok(declarations),
                Some('}') => return Err(self.error(ParseErrorKind::UnexpectedCloseBrace)),

                // "<semicolon-token>"
                // "Do nothing."
                Some(';') => self.position += 1,

                // "<at-keyword-token>"
                // Nested at-rules are skipped.
                Some('@') => {
                    let _ = self.consume_at_rule()?;
                }

                Some(_) => {
                    if let Some(declaration) = self.consume_declaration()? {
                        declarations.push(declaration);
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    ///
    /// Returns `None` for text without a `name: value` shape.
    fn consume_declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        let text = self.consume_component_text(|c| c == ';')?;

        // "If the next input token is anything other than a <colon-token>,
        // this is a parse error. Return nothing."
        let Some((name, value)) = text.split_once(':') else {
            warn_once("CSS", &format!("dropping malformed declaration '{text}'"));
            return Ok(None);
        };
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            warn_once("CSS", &format!("dropping malformed declaration '{text}'"));
            return Ok(None);
        }
        let property = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };

        let (value, important) = trim_important(value.trim());
        Ok(Some(Declaration {
            property,
            value: value.to_string(),
            important,
        }))
    }
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation"
/// Returns the value without the annotation and whether it was present.
fn trim_important(value: &str) -> (&str, bool) {
    const IMPORTANT: &str = "important";

    if value.len() < IMPORTANT.len() {
        return (value, false);
    }
    let split = value.len() - IMPORTANT.len();
    if !value.is_char_boundary(split) || !value[split..].eq_ignore_ascii_case(IMPORTANT) {
        return (value, false);
    }
    let Some(rest) = value[..split].trim_end().strip_suffix('!') else {
        return (value, false);
    };
    (rest.trim_end(), true)
}

/// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// "A selector list is a comma-separated list of selectors"
fn split_selector_list(prelude: &str) -> Vec<String> {
    let mut selectors = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in prelude.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if let Some(q) = quote {
            if c == q {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    selectors.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
        }
        current.push(c);
    }
    selectors.push(current);

    selectors
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Pull the URL and media list out of an `@import` prelude.
fn parse_import_prelude(prelude: &str) -> Option<Import> {
    let prelude = prelude.trim();

    let (url, rest) = if let Some(after) = prelude
        .get(..4)
        .filter(|head| head.eq_ignore_ascii_case("url("))
        .map(|_| &prelude[4..])
    {
        let close = after.find(')')?;
        (unquote(after[..close].trim()), &after[close + 1..])
    } else if let Some(quote) = prelude.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let body = &prelude[1..];
        let close = body.find(quote)?;
        (&body[..close], &body[close + 1..])
    } else {
        let end = prelude.find(char::is_whitespace).unwrap_or(prelude.len());
        (&prelude[..end], &prelude[end..])
    };

    if url.is_empty() {
        return None;
    }
    Some(Import {
        url: url.to_string(),
        media: rest.trim().to_string(),
    })
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_important() {
        assert_eq!(trim_important("red !important"), ("red", true));
        assert_eq!(trim_important("red!IMPORTANT"), ("red", true));
        assert_eq!(trim_important("red ! important"), ("red", true));
        assert_eq!(trim_important("important"), ("important", false));
        assert_eq!(trim_important("red"), ("red", false));
    }

    #[test]
    fn test_split_selector_list_keeps_nested_commas() {
        assert_eq!(
            split_selector_list("h1, a[title='x,y'] , :is(p, li)"),
            vec!["h1", "a[title='x,y']", ":is(p, li)"]
        );
    }

    #[test]
    fn test_parse_import_prelude_forms() {
        let import = parse_import_prelude("url(\"fineprint.css\") print").unwrap();
        assert_eq!(import.url, "fineprint.css");
        assert_eq!(import.media, "print");

        let import = parse_import_prelude("'custom.css'").unwrap();
        assert_eq!(import.url, "custom.css");
        assert!(import.media.is_empty());

        let import = parse_import_prelude("url(landscape.css) screen and (orientation:landscape)")
            .unwrap();
        assert_eq!(import.url, "landscape.css");
        assert_eq!(import.media, "screen and (orientation:landscape)");
    }
}
