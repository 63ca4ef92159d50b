//! Read-only queries over a resolved style.
//!
//! Everything a layout or paint pass asks of a [`StyleMap`] without needing
//! the surrounding tree. Queries that need an ancestor width live in
//! [`crate::length`].

use marten_common::warning::warn_once;

use crate::color::{self, Color};
use crate::declaration::StyleMap;
use crate::error::ValueError;

impl StyleMap {
    /// [§ 2 Box Layout Modes](https://www.w3.org/TR/css-display-3/#the-display-properties)
    ///
    /// Hidden by `display: none` or by one of the visually-hidden idioms:
    /// `clip: rect(1px, 1px, 1px, 1px)`, or a box exactly `1px` by `1px`.
    #[must_use]
    pub fn is_display_none(&self) -> bool {
        if self.css("display") == "none" {
            return true;
        }
        let clip: String = self.css("clip").split_whitespace().collect();
        if clip == "rect(1px,1px,1px,1px)" {
            return true;
        }
        self.css("width") == "1px" && self.css("height") == "1px"
    }

    /// Flows inline: `display: inline`, `display: inline-block`, or
    /// `float: left`.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.css("float") == "left" || matches!(self.css("display"), "inline" | "inline-block")
    }

    /// `display: flex`.
    #[must_use]
    pub fn is_flex(&self) -> bool {
        self.css("display") == "flex"
    }

    /// Main axis of a flex container is horizontal. Only an explicit
    /// `flex-direction: column` turns it vertical.
    #[must_use]
    pub fn is_flex_row(&self) -> bool {
        self.css("flex-direction") != "column"
    }

    /// Parsed color of `property`, `None` when absent.
    ///
    /// # Errors
    ///
    /// [`ValueError::InvalidColor`] when the value is present but unreadable.
    pub fn try_color(&self, property: &str) -> Result<Option<Color>, ValueError> {
        self.value(property).map(Color::parse).transpose()
    }

    /// Foreground `color`, opaque black when absent or unreadable.
    #[must_use]
    pub fn color(&self) -> Color {
        self.try_color("color")
            .unwrap_or_else(|err| {
                warn_once("style", &err.to_string());
                None
            })
            .unwrap_or_default()
    }

    /// Font size in pixels.
    ///
    /// Absent or empty means `base`. The last two characters are taken as the
    /// unit and dropped; an `em` value multiplies by `base`. Anything that
    /// then fails to parse is `base`, with a warning.
    #[must_use]
    pub fn font_size(&self, base: f64) -> f64 {
        let value = self.css("font-size");
        if value.is_empty() {
            return base;
        }
        if value.len() <= 2 || !value.is_char_boundary(value.len() - 2) {
            warn_once("style", &format!("font-size too short: {value}"));
            return base;
        }

        // FIXME: three-letter units such as `rem` leave a letter behind and fall back to `base`.
        let Ok(size) = value[..value.len() - 2].parse::<f64>() else {
            warn_once("style", &format!("cannot parse font-size {value}"));
            return base;
        };
        if value.ends_with("em") {
            size * base
        } else {
            size
        }
    }

    /// Background color from `background-color`, then `background`.
    ///
    /// A `linear-gradient(...)` yields the average of its first and last
    /// `rgb()` stops. For a `background` shorthand the first token that reads
    /// as a color is used.
    #[must_use]
    pub fn background_color(&self) -> Option<Color> {
        ["background-color", "background"]
            .into_iter()
            .filter_map(|property| self.value(property))
            .find_map(|value| {
                if let Some((first, last)) = color::gradient_stops(value) {
                    return Some(first.average(last));
                }
                Color::parse(value).ok().or_else(|| {
                    value
                        .split_whitespace()
                        .find_map(|token| Color::parse(token).ok())
                })
            })
    }

    /// URL of the first `url(...)` in `background-image` or `background`,
    /// with any quotes removed.
    #[must_use]
    pub fn background_image_url(&self) -> Option<String> {
        ["background-image", "background"]
            .into_iter()
            .filter_map(|property| self.value(property))
            .find_map(|value| {
                let start = value.find("url(")? + "url(".len();
                let end = start + value[start..].find(')')?;
                let url = value[start..end].trim().trim_matches(|c: char| c == '"' || c == '\'');
                (!url.is_empty()).then(|| url.to_string())
            })
    }

    /// Family names of `font-family` in declared order, unquoted.
    #[must_use]
    pub fn font_family_preferences(&self) -> Vec<String> {
        self.css("font-family")
            .split(',')
            .map(|family| family.trim().trim_matches(|c: char| c == '"' || c == '\''))
            .filter(|family| !family.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Pick a font from `available` for the ordered `preferences`.
///
/// An available entry matches a preference when it equals it after dropping a
/// trailing `/`. With no preference available the first available font is
/// used; with no inventory at all, the first preference.
#[must_use]
pub fn preferred_font_name<'a>(preferences: &'a [String], available: &'a [String]) -> Option<&'a str> {
    if available.is_empty() {
        return preferences.first().map(String::as_str);
    }
    preferences
        .iter()
        .find_map(|preference| {
            available
                .iter()
                .find(|name| name.trim_end_matches('/') == preference)
        })
        .or_else(|| available.first())
        .map(String::as_str)
}
