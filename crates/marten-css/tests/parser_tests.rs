//! Integration tests for the stylesheet parser.

use marten_css::{ParseErrorKind, parse_declarations, parse_stylesheet, preprocess};

#[test]
fn test_parse_inline_declarations() {
    let declarations = parse_declarations("color: red;").unwrap();
    assert_eq!(declarations.len(), 1);
    assert_eq!(declarations[0].property, "color");
    assert_eq!(declarations[0].value, "red");
    assert!(!declarations[0].important);

    // Trailing semicolon is optional
    let declarations = parse_declarations("width: 10px; height:20px").unwrap();
    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[1].property, "height");
    assert_eq!(declarations[1].value, "20px");
}

#[test]
fn test_parse_rules_with_important_and_custom_properties() {
    let css = r"
        h1 {
            font-weight: bold;
            font-size: 100px;
        }
        p, quote, div {
            color: grey !important;
        }
        :root {
            --emph: red;
            --h: 10px;
        }

        b {
            color: var(--emph);
        }
    ";
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.rules.len(), 4);

    let h1 = &sheet.rules[0];
    assert_eq!(h1.selectors, vec!["h1"]);
    assert_eq!(h1.declarations.len(), 2);
    assert_eq!(h1.declarations[0].property, "font-weight");
    assert_eq!(h1.declarations[0].value, "bold");
    assert!(!h1.declarations[0].important);

    let p = &sheet.rules[1];
    assert_eq!(p.selectors, vec!["p", "quote", "div"]);
    assert_eq!(p.declarations[0].value, "grey");
    assert!(p.declarations[0].important);

    let root = &sheet.rules[2];
    assert_eq!(root.selectors, vec![":root"]);
    assert_eq!(root.declarations[0].property, "--emph");
    assert_eq!(root.declarations[0].value, "red");

    assert_eq!(sheet.rules[3].declarations[0].value, "var(--emph)");
}

#[test]
fn test_parse_media_block() {
    let css = r"
        @media only screen and (max-width: 600px) {
          body {
            background-color: lightblue;
          }
        }
    ";
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.rules.len(), 1);

    let media = &sheet.rules[0];
    assert!(media.is_at_rule());
    assert_eq!(media.name.as_deref(), Some("media"));
    assert_eq!(media.prelude, "only screen and (max-width: 600px)");
    assert!(media.selectors.is_empty());
    assert!(media.declarations.is_empty());

    let body = &media.nested_rules[0];
    assert_eq!(body.selectors, vec!["body"]);
    assert_eq!(body.declarations[0].property, "background-color");
    assert_eq!(body.declarations[0].value, "lightblue");
}

#[test]
fn test_parse_skips_comments() {
    let css = r"
        h1 { font-weight: bold; /* heavy */ font-size: 100px; }
        /* grey text */
        p { color: grey !important; }
    ";
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.rules.len(), 2);
    assert_eq!(sheet.rules[0].declarations.len(), 2);
    assert_eq!(sheet.rules[1].selectors, vec!["p"]);
    assert!(sheet.rules[1].declarations[0].important);
}

#[test]
fn test_parse_attribute_selector_prelude() {
    let sheet = parse_stylesheet("a[href] {\n  color: blue;\n  margin-right: 2px;\n}").unwrap();
    assert_eq!(sheet.rules[0].selectors, vec!["a[href]"]);
    assert_eq!(sheet.rules[0].declarations[1].property, "margin-right");
}

#[test]
fn test_parse_drops_charset_and_import_statements() {
    let css = r#"
        @charset "UTF-8";.info{z-index:3;}
        @media only screen and (max-width: 600px) {
          body { background-color: lightblue; }
        }
    "#;
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.rules.len(), 2);
    assert_eq!(sheet.rules[0].selectors, vec![".info"]);
    assert_eq!(sheet.rules[1].nested_rules[0].declarations[0].value, "lightblue");

    let css = r"
        @import url(https://fonts.googleapis.com/css?family=Montserrat:400,400i,700,800);.info{z-index:3;}
        @media only screen and (max-width: 600px) {
          body { background-color: lightblue; }
        }
    ";
    let sheet = parse_stylesheet(css).unwrap();
    assert_eq!(sheet.rules.len(), 2);
}

#[test]
fn test_font_face_block_holds_declarations() {
    let sheet =
        parse_stylesheet("@font-face { font-family: \"Open Sans\"; src: url(a.woff2); }").unwrap();
    let rule = &sheet.rules[0];
    assert_eq!(rule.name.as_deref(), Some("font-face"));
    assert!(rule.nested_rules.is_empty());
    assert_eq!(rule.declarations[0].value, "\"Open Sans\"");
    assert_eq!(rule.declarations[1].value, "url(a.woff2)");
}

#[test]
fn test_whitespace_inside_values_is_collapsed() {
    let declarations = parse_declarations("margin:\n  10px\t 5px ;").unwrap();
    assert_eq!(declarations[0].value, "10px 5px");
}

#[test]
fn test_malformed_declaration_is_dropped() {
    let sheet = parse_stylesheet("p { color red; width: 3px }").unwrap();
    assert_eq!(sheet.rules[0].declarations.len(), 1);
    assert_eq!(sheet.rules[0].declarations[0].property, "width");
}

#[test]
fn test_structural_errors_are_fatal() {
    let err = parse_stylesheet("p { color: red;").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnclosedBlock);

    let err = parse_stylesheet("p { color: red; }\n}").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnexpectedCloseBrace);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 1);
    assert_eq!(err.kind.to_string(), "unexpected '}'");

    let err = parse_stylesheet("p { font-family: \"Open Sans; }").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedString);

    let err = parse_stylesheet("/* never closed").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::UnterminatedComment);

    let err = parse_stylesheet("p").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MissingBlock);
}

#[test]
fn test_preprocess_collects_imports() {
    let imports = [
        (r#"@import url("fineprint.css") print;"#, "fineprint.css"),
        (r#"@import url("bluish.css") projection, tv;"#, "bluish.css"),
        ("@import 'custom.css';", "custom.css"),
        (r#"@import url("example://path/folder/");"#, "example://path/folder/"),
        (r#"@import "common.css" screen, projection;"#, "common.css"),
        (
            "@import url('landscape.css') screen and (orientation:landscape);",
            "landscape.css",
        ),
    ];
    let main = r"
        @media only screen and (max-width: 600px) {
          body { background-color: lightblue; }
        }
    ";

    for (import, expected) in imports {
        let preprocessed = preprocess(&format!("{import}{main}")).unwrap();
        assert_eq!(preprocessed.imports.len(), 1, "{import}");
        assert_eq!(preprocessed.imports[0].url, expected);
        assert!(preprocessed.css.trim_start().starts_with("@media"));
    }
}

#[test]
fn test_preprocess_keeps_media_list_and_skips_charset() {
    let preprocessed =
        preprocess("@charset \"UTF-8\";\n@import url(\"fineprint.css\") print;\np{}").unwrap();
    assert_eq!(preprocessed.imports[0].media, "print");
    assert_eq!(preprocessed.css.trim(), "p{}");
}
