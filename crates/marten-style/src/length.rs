//! Length resolution
//!
//! [CSS Values and Units Level 4](https://www.w3.org/TR/css-values-4/)
//!
//! Converts declared length strings into pixels. Percentages resolve against
//! the nearest ancestor with a known width, which is why most functions here
//! take a [`StyleTree`] node rather than a bare [`StyleMap`].
//!
//! Known simplifications:
//! - `em` and `rem` both multiply by the base font size.
//! - Unitless numbers other than `0` are rejected.

use marten_common::warning::warn_once;
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::declaration::StyleMap;
use crate::error::ValueError;

/// Base font size in pixels used for `em`/`rem` and as the default `font-size`.
pub const DEFAULT_BASE_FONT_SIZE: f64 = 11.0;

/// Something with a parent and a resolved style.
///
/// Percentage lengths walk this chain upward until an ancestor has a width.
/// A detached `&StyleMap` is a tree of one node.
pub trait StyleTree: Copy {
    /// The enclosing node, `None` at the root.
    fn parent(&self) -> Option<Self>;
    /// The node's resolved style.
    fn style(&self) -> &StyleMap;
}

impl StyleTree for &StyleMap {
    fn parent(&self) -> Option<Self> {
        None
    }

    fn style(&self) -> &StyleMap {
        self
    }
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 1080.0,
        }
    }
}

/// Inputs shared by every length resolution in one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolutionContext {
    /// Viewport used for `vw`, `vh` and root widths.
    pub viewport: Viewport,
    /// Pixel size of `1em`.
    pub base_font_size: f64,
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            base_font_size: DEFAULT_BASE_FONT_SIZE,
        }
    }
}

/// Recognized length suffixes. Declaration order is the order suffixes are
/// tested in, so `rem` is tried before `em`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr, Display, Serialize)]
pub enum Unit {
    /// [§ 6.1 Absolute lengths](https://www.w3.org/TR/css-values-4/#absolute-lengths)
    #[strum(serialize = "px")]
    Px,
    /// [§ 4.3 Percentages](https://www.w3.org/TR/css-values-4/#percentages)
    #[strum(serialize = "%")]
    Percent,
    /// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    #[strum(serialize = "rem")]
    Rem,
    /// [§ 5.1.1 Font-relative lengths](https://www.w3.org/TR/css-values-4/#font-relative-lengths)
    #[strum(serialize = "em")]
    Em,
    /// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
    #[strum(serialize = "vw")]
    Vw,
    /// [§ 5.1.2 Viewport-percentage lengths](https://www.w3.org/TR/css-values-4/#viewport-relative-lengths)
    #[strum(serialize = "vh")]
    Vh,
}

/// A parsed length: number plus unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Length {
    /// The numeric part.
    pub value: f64,
    /// The unit suffix.
    pub unit: Unit,
}

impl Length {
    /// Parse a length such as `12px`, `50%` or `1.5em`.
    ///
    /// `auto`, `inherit` and `0` are `0px`. An empty number before a known
    /// suffix counts as zero.
    ///
    /// # Errors
    ///
    /// [`ValueError::UnknownUnit`] when no known suffix ends the text,
    /// [`ValueError::InvalidNumber`] when the number before it is malformed.
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        let text = text.trim();
        if matches!(text, "auto" | "inherit" | "0") {
            return Ok(Self {
                value: 0.0,
                unit: Unit::Px,
            });
        }

        let unit = Unit::iter()
            .find(|unit| text.ends_with(unit.as_ref()))
            .ok_or_else(|| ValueError::UnknownUnit(text.to_string()))?;
        let number = &text[..text.len() - unit.as_ref().len()];
        let value = if number.is_empty() {
            0.0
        } else {
            number
                .parse::<f64>()
                .map_err(|_| ValueError::InvalidNumber(text.to_string()))?
        };

        Ok(Self { value, unit })
    }

    /// Pixels without any node context. Percentages resolve to `0`.
    #[must_use]
    pub fn to_absolute(&self, ctx: &ResolutionContext) -> f64 {
        match self.unit {
            Unit::Px => self.value,
            Unit::Em | Unit::Rem => self.value * ctx.base_font_size,
            Unit::Vw => self.value * ctx.viewport.width / 100.0,
            Unit::Vh => self.value * ctx.viewport.height / 100.0,
            Unit::Percent => 0.0,
        }
    }
}

/// Resolve `text` to pixels for `node`.
///
/// A percentage is taken of the parent's base width; at the root it
/// resolves to `0`.
///
/// # Errors
///
/// See [`Length::parse`].
pub fn to_pixels<T: StyleTree>(node: T, text: &str, ctx: &ResolutionContext) -> Result<f64, ValueError> {
    let length = Length::parse(text)?;
    if length.unit != Unit::Percent {
        return Ok(length.to_absolute(ctx));
    }
    let Some(parent) = node.parent() else {
        warn_once("style", "% unit used in root element");
        return Ok(0.0);
    };
    Ok(length.value * 0.01 * base_width(parent, ctx))
}

/// Resolve the declared value of `property` for `node`, if present.
///
/// # Errors
///
/// See [`Length::parse`].
pub fn css_px<T: StyleTree>(node: T, property: &str, ctx: &ResolutionContext) -> Result<Option<f64>, ValueError> {
    node.style()
        .value(property)
        .map(|value| to_pixels(node, value, ctx))
        .transpose()
}

/// Resolve `property`, logging a malformed value and treating it as `0`.
fn px_or_zero<T: StyleTree>(node: T, property: &str, ctx: &ResolutionContext) -> f64 {
    css_px(node, property, ctx)
        .unwrap_or_else(|err| {
            warn_once("style", &format!("cannot parse {property}: {err}"));
            None
        })
        .unwrap_or(0.0)
}

/// Used width of `node`.
///
/// A positive `width` wins; otherwise the root takes the viewport width and
/// everything else is `0` (left to layout). A smaller positive `max-width`
/// clamps the result.
#[must_use]
pub fn width<T: StyleTree>(node: T, ctx: &ResolutionContext) -> f64 {
    let declared = px_or_zero(node, "width", ctx);
    let w = if declared > 0.0 {
        declared
    } else if node.parent().is_none() {
        ctx.viewport.width
    } else {
        0.0
    };

    if w > 0.0 && node.style().contains("max-width") {
        let max = px_or_zero(node, "max-width", ctx);
        if 0.0 < max && max < w {
            return max;
        }
    }
    w
}

/// Declared `height` of `node` in pixels, `0` when absent or malformed.
#[must_use]
pub fn height<T: StyleTree>(node: T, ctx: &ResolutionContext) -> f64 {
    px_or_zero(node, "height", ctx)
}

/// The width percentages of `node`'s children resolve against: its own width
/// if known, else the nearest ancestor's, else the viewport width.
#[must_use]
pub fn base_width<T: StyleTree>(node: T, ctx: &ResolutionContext) -> f64 {
    let w = width(node, ctx);
    if w != 0.0 {
        return w;
    }
    node.parent()
        .map_or(ctx.viewport.width, |parent| base_width(parent, ctx))
}

/// Four box edges in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Edges {
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub right: f64,
    /// Bottom edge.
    pub bottom: f64,
    /// Left edge.
    pub left: f64,
}

/// [§ 4.2 Shorthand properties](https://www.w3.org/TR/css-cascade-4/#shorthand)
///
/// Expand a `top right bottom left` shorthand such as `margin` or `padding`,
/// then apply any `-top`/`-right`/`-bottom`/`-left` longhands.
///
/// | tokens | top | right | bottom | left |
/// |---|---|---|---|---|
/// | `a` | a | a | a | a |
/// | `a b` | a | b | a | b |
/// | `a b c` | a | b | c | b |
/// | `a b c d` | a | b | c | d |
///
/// A malformed longhand is ignored.
///
/// # Errors
///
/// Fails if a token of the shorthand is not a length.
pub fn edges<T: StyleTree>(node: T, key: &str, ctx: &ResolutionContext) -> Result<Edges, ValueError> {
    let mut edges = Edges::default();

    if let Some(all) = node.style().value(key) {
        let tokens: Vec<&str> = all.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ValueError::UnknownUnit(all.to_string()));
        }
        let nums = tokens
            .iter()
            .map(|token| to_pixels(node, token, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        edges.top = nums[0];
        edges.right = nums.get(1).copied().unwrap_or(edges.top);
        edges.bottom = nums.get(2).copied().unwrap_or(edges.top);
        edges.left = nums.get(3).copied().unwrap_or(edges.right);
    }

    let sides: [(&str, &mut f64); 4] = [
        ("top", &mut edges.top),
        ("right", &mut edges.right),
        ("bottom", &mut edges.bottom),
        ("left", &mut edges.left),
    ];
    for (side, slot) in sides {
        if let Ok(Some(px)) = css_px(node, &format!("{key}-{side}"), ctx) {
            *slot = px;
        }
    }

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_priority() {
        assert_eq!(Length::parse("2rem").unwrap().unit, Unit::Rem);
        assert_eq!(Length::parse("2em").unwrap().unit, Unit::Em);
        assert_eq!(Length::parse("50%").unwrap().unit, Unit::Percent);
    }

    #[test]
    fn test_keywords_are_zero() {
        for keyword in ["auto", "inherit", "0"] {
            assert_eq!(Length::parse(keyword).unwrap().value, 0.0);
        }
    }

    #[test]
    fn test_bad_lengths() {
        assert_eq!(Length::parse("12pt"), Err(ValueError::UnknownUnit("12pt".into())));
        assert_eq!(Length::parse("12"), Err(ValueError::UnknownUnit("12".into())));
        assert_eq!(Length::parse("x1px"), Err(ValueError::InvalidNumber("x1px".into())));
        assert_eq!(Length::parse("px").unwrap().value, 0.0);
    }

    #[test]
    fn test_absolute_units() {
        let ctx = ResolutionContext::default();
        assert_eq!(Length::parse("2em").unwrap().to_absolute(&ctx), 22.0);
        assert_eq!(Length::parse("2rem").unwrap().to_absolute(&ctx), 22.0);
        assert_eq!(Length::parse("10vw").unwrap().to_absolute(&ctx), 128.0);
        assert_eq!(Length::parse("10vh").unwrap().to_absolute(&ctx), 108.0);
    }
}
