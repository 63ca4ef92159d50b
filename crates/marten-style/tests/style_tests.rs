//! Integration tests for the style query facade, lengths and fonts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use marten_dom::{DomTree, SourceNode};
use marten_style::length::{self, Length, Unit};
use marten_style::{
    Color, Edges, FontCache, FontMetrics, ResolutionContext, StyleEngine, StyleMap, ValueError,
    Viewport,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn style(declarations: &[(&str, &str)]) -> StyleMap {
    let mut map = StyleMap::new();
    for (property, value) in declarations {
        map.set_css(property, value);
    }
    map
}

fn ctx() -> ResolutionContext {
    ResolutionContext::default()
}

#[test]
fn test_margin_shorthand_two_values() {
    let s = style(&[("margin", "10px 5px")]);
    let edges = length::edges(&s, "margin", &ctx()).unwrap();
    assert_eq!(
        edges,
        Edges {
            top: 10.0,
            right: 5.0,
            bottom: 10.0,
            left: 5.0,
        }
    );
}

#[test]
fn test_shorthand_expansion_and_longhands() {
    let s = style(&[("padding", "1px 2px 3px")]);
    let edges = length::edges(&s, "padding", &ctx()).unwrap();
    assert_eq!((edges.top, edges.right, edges.bottom, edges.left), (1.0, 2.0, 3.0, 2.0));

    let s = style(&[("padding", "1px 2px 3px 4px"), ("padding-left", "9px")]);
    let edges = length::edges(&s, "padding", &ctx()).unwrap();
    assert_eq!((edges.top, edges.right, edges.bottom, edges.left), (1.0, 2.0, 3.0, 9.0));

    let s = style(&[("margin", "1em"), ("margin-top", "bogus")]);
    let edges = length::edges(&s, "margin", &ctx()).unwrap();
    assert_eq!(edges.top, 11.0, "malformed longhand is ignored");
    assert_eq!(edges.left, 11.0);

    let s = style(&[("margin-bottom", "3px")]);
    let edges = length::edges(&s, "margin", &ctx()).unwrap();
    assert_eq!((edges.top, edges.bottom), (0.0, 3.0));
}

#[test]
fn test_bad_shorthand_token_is_an_error() {
    let s = style(&[("margin", "4px 3pt")]);
    assert_eq!(
        length::edges(&s, "margin", &ctx()),
        Err(ValueError::UnknownUnit("3pt".to_string()))
    );
}

#[test]
fn test_units() {
    let ctx = ResolutionContext {
        viewport: Viewport {
            width: 1000.0,
            height: 500.0,
        },
        base_font_size: 10.0,
    };
    let px = |text: &str| Length::parse(text).unwrap().to_absolute(&ctx);
    assert_eq!(px("12px"), 12.0);
    assert_eq!(px("1.5em"), 15.0);
    assert_eq!(px("2rem"), 20.0);
    assert_eq!(px("10vw"), 100.0);
    assert_eq!(px("10vh"), 50.0);
    assert_eq!(px("auto"), 0.0);
    assert_eq!(px("px"), 0.0);
    assert_eq!(Length::parse("25%").unwrap().unit, Unit::Percent);
    assert!(matches!(Length::parse("1.2.3px"), Err(ValueError::InvalidNumber(_))));
}

#[test]
fn test_malformed_width_falls_back_to_zero() {
    init_logging();
    let doc = DomTree::from_source(&SourceNode::element(
        "html",
        vec![SourceNode::element(
            "body",
            vec![SourceNode::element_with("div", &[("style", "width: wide")], vec![])],
        )],
    ));
    let tree = StyleEngine::new().resolve(&doc, &[] as &[&str]).unwrap();
    let div = tree.root().find_first_descendant("div").unwrap();
    assert_eq!(div.width(), 0.0);
    assert!(div.css_px("width").is_err());
    assert_eq!(div.css_px("height"), Ok(None));
}

#[test]
fn test_background_color_forms() {
    assert_eq!(style(&[("background", "#000000")]).background_color(), Some(Color::BLACK));
    assert_eq!(
        style(&[("background-color", "#ffffff")]).background_color(),
        Some(Color::WHITE)
    );
    assert_eq!(
        style(&[("background", "lightblue url(/a.png) no-repeat")]).background_color(),
        Some(Color::rgb(173, 216, 230))
    );
    assert_eq!(style(&[("background", "url(/a.png) no-repeat")]).background_color(), None);
    assert_eq!(style(&[]).background_color(), None);
}

#[test]
fn test_gradient_background_averages_end_stops() {
    let cases = [
        ("linear-gradient(to right,rgb(10,0,50,1),rgb(200,0,50,1))", 0x6900_32ff),
        ("linear-gradient(to right,rgb(0,60,60,1),rgba(0,180,180,1))", 0x0078_78ff),
        (
            "linear-gradient(to bottom, rgba(40,40,40,1) 0%,rgba(40,40,40,1) 100%)",
            0x2828_28ff,
        ),
    ];
    for (value, expected) in cases {
        let color = style(&[("background", value)]).background_color().unwrap();
        assert_eq!(color.to_rgba_u32(), expected, "{value}");
    }
}

#[test]
fn test_background_image_url() {
    for value in ["url(/foo.png)", "url('/foo.png')", "url(\"/foo.png\")"] {
        assert_eq!(
            style(&[("background-image", value)]).background_image_url().as_deref(),
            Some("/foo.png"),
            "{value}"
        );
    }
    assert_eq!(
        style(&[("background", "#fff url(/bg.gif) repeat-x")]).background_image_url().as_deref(),
        Some("/bg.gif")
    );
    assert_eq!(style(&[("background", "red")]).background_image_url(), None);
}

#[test]
fn test_css_accessors() {
    let mut s = style(&[("color", "red")]);
    assert_eq!(s.css("color"), "red");
    assert_eq!(s.css("margin"), "");
    s.set_css("color", "blue");
    assert_eq!(s.css("color"), "blue");
    assert_eq!(s.len(), 1);
    assert!(s.remove("color").is_some());
    assert!(s.is_empty());
}

fn metrics_opener(calls: Arc<AtomicUsize>) -> impl Fn(&str) -> Option<FontMetrics> + Send + Sync {
    move |name: &str| {
        let _ = calls.fetch_add(1, Ordering::SeqCst);
        let size: f64 = name.rsplit('/').next()?.parse().ok()?;
        Some(FontMetrics {
            height: size + 3.0,
            ascent: size,
        })
    }
}

#[test]
fn test_font_is_chosen_and_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = StyleEngine::new()
        .with_fonts(vec!["dejavu/".to_string(), "lucida/".to_string()])
        .with_font_sizes(vec![8, 10, 13, 20])
        .with_font_opener(metrics_opener(Arc::clone(&calls)));

    let s = style(&[("font-family", "Lucida, serif"), ("font-size", "14px")]);
    // "Lucida" does not equal "lucida", so the first available font is used.
    let font = engine.font(&s).unwrap();
    assert_eq!(font.height, 16.0);
    assert!(engine.font_cache().get("dejavu/13").is_some());

    let s = style(&[("font-family", "lucida"), ("font-size", "2em")]);
    assert_eq!(engine.font_height(&s), 23.0);
    assert!(engine.font_cache().get("lucida/20").is_some());

    let _ = engine.font(&s);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(engine.font_cache().len(), 2);
}

#[test]
fn test_font_cache_is_shared_between_engines() {
    let cache = Arc::new(FontCache::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let make = || {
        StyleEngine::new()
            .with_fonts(vec!["mono/".to_string()])
            .with_font_sizes(vec![11])
            .with_font_opener(metrics_opener(Arc::clone(&calls)))
            .with_font_cache(Arc::clone(&cache))
    };

    let s = StyleMap::new();
    let first = make().font(&s).unwrap();
    let second = make().font(&s).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_font_height_without_fonts() {
    let engine = StyleEngine::new();
    assert!(engine.font(&StyleMap::new()).is_none());
    assert!((engine.font_height(&style(&[("font-size", "10px")])) - 12.0).abs() < 1e-9);
    assert_eq!(
        engine.preferred_font_name(&["Arial".to_string()]),
        Some("Arial")
    );
}
