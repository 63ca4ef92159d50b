//! User-Agent add-on stylesheet
//!
//! [CSS Cascading § 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
//!
//! "Each style rule has a cascade origin, which determines where it enters the
//! cascade."
//!
//! Only `display` defaults and link colouring are supplied. The sheet is matched
//! before any author sheet, so author rules for the same property win.

use std::sync::OnceLock;

use crate::error::ParseError;
use crate::parser::{Stylesheet, parse_stylesheet};

/// Default rules prepended to every author stylesheet.
pub const ADD_ON_CSS: &str = r"
/* https://developer.mozilla.org/en-US/docs/Web/HTML/Inline_elements */
a, abbr, acronym, audio, b, bdi, bdo, big, br, button, canvas, cite, code, data,
datalist, del, dfn, em, embed, i, iframe, img, input, ins, kbd, label, map, mark,
meter, noscript, object, output, picture, progress, q, ruby, s, samp, script,
select, slot, small, span, strong, sub, sup, svg, template, textarea, time, u, tt,
var, video, wbr {
  display: inline;
}

/* Legacy presentational elements */
font, strike, tt {
  display: inline;
}

button, textarea, input, select {
  display: inline-block;
}

/* https://developer.mozilla.org/en-US/docs/Web/HTML/Block-level_elements */
address, article, aside, blockquote, details, dialog, dd, div, dl, dt, fieldset,
figcaption, figure, footer, form, h1, h2, h3, h4, h5, h6, header, hgroup, hr, li,
main, nav, ol, p, pre, section, table, ul {
  display: block;
}

a {
  color: blue;
  margin-right: 2px;
}
";

/// The parsed [`ADD_ON_CSS`], parsed once and cached via `OnceLock`.
///
/// # Errors
///
/// Only fails if [`ADD_ON_CSS`] itself stops parsing, which the tests guard.
pub fn add_on_stylesheet() -> Result<&'static Stylesheet, &'static ParseError> {
    static STYLESHEET: OnceLock<Result<Stylesheet, ParseError>> = OnceLock::new();
    STYLESHEET.get_or_init(|| parse_stylesheet(ADD_ON_CSS)).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_on_stylesheet_parses() {
        let sheet = add_on_stylesheet().unwrap();
        assert_eq!(sheet.rules.len(), 5);
        let link = &sheet.rules[4];
        assert_eq!(link.selectors, vec!["a"]);
        assert_eq!(link.declarations[0].property, "color");
        assert_eq!(link.declarations[0].value, "blue");
    }
}
