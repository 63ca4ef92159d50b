//! CSS Color values and parsing
//!
//! [CSS Color Level 4](https://www.w3.org/TR/css-color-4/)

use serde::Serialize;

use crate::error::ValueError;

/// [§ 4 Color syntax](https://www.w3.org/TR/css-color-4/#color-syntax)
/// sRGB color represented as RGBA components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Color {
    /// "the red color channel" (0-255)
    pub r: u8,
    /// "the green color channel" (0-255)
    pub g: u8,
    /// "the blue color channel" (0-255)
    pub b: u8,
    /// "the alpha channel" (0-255, 255 = fully opaque)
    pub a: u8,
}

impl Color {
    /// Opaque black, the fallback for unparsable colors.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// An opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Pack as `0xRRGGBBAA`.
    #[must_use]
    pub const fn to_rgba_u32(self) -> u32 {
        ((self.r as u32) << 24) | ((self.g as u32) << 16) | ((self.b as u32) << 8) | self.a as u32
    }

    /// Parse a color value.
    ///
    /// Accepted forms, tried in order:
    /// - `rgb(r, g, b)` / `rgba(r, g, b, a)` with integer channels
    /// - `#rgb` and `#rrggbb`
    /// - a CSS named color such as `lightblue` or `grey`, in any case
    ///
    /// The alpha of `rgba()` is ignored, the result is always opaque.
    ///
    /// # Errors
    ///
    /// [`ValueError::InvalidColor`] for anything else, including `inherit`.
    pub fn parse(value: &str) -> Result<Self, ValueError> {
        let value = value.trim();
        let invalid = || ValueError::InvalidColor(value.to_string());

        if value.eq_ignore_ascii_case("inherit") {
            return Err(invalid());
        }
        if value.starts_with("rgb") {
            return parse_rgb_function(value).ok_or_else(invalid);
        }
        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex(hex).ok_or_else(invalid);
        }

        let [r, g, b] = *csscolorparser::NAMED_COLORS
            .get(value.to_ascii_lowercase().as_str())
            .ok_or_else(invalid)?;
        Ok(Self::rgb(r, g, b))
    }

    /// [§ 5.2 The RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    ///
    /// "The three-digit RGB notation (#RGB) is converted into six-digit form
    /// (#RRGGBB) by replicating digits, not by adding zeros."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb(r, g, b))
            }
            _ => None,
        }
    }

    /// Channel-wise average of two colors.
    #[must_use]
    pub const fn average(self, other: Self) -> Self {
        const fn mid(x: u8, y: u8) -> u8 {
            ((x as u16 + y as u16) / 2) as u8
        }
        Self {
            r: mid(self.r, other.r),
            g: mid(self.g, other.g),
            b: mid(self.b, other.b),
            a: mid(self.a, other.a),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// `rgb(10,0,50)` or `rgba(10, 0, 50, 1)`. Only the first three channels
/// are read.
fn parse_rgb_function(value: &str) -> Option<Color> {
    let open = value.find('(')?;
    let name = &value[..open];
    if name != "rgb" && name != "rgba" {
        return None;
    }
    let inner = value[open + 1..].strip_suffix(')')?;
    let mut channels = inner
        .split(|c: char| c == ',' || c.is_whitespace() || c == '/')
        .filter(|part| !part.is_empty());

    let mut channel = || -> Option<u8> {
        let n: i64 = channels.next()?.parse().ok()?;
        u8::try_from(n.clamp(0, 255)).ok()
    };
    Some(Color::rgb(channel()?, channel()?, channel()?))
}

/// Colors of the first and last `rgb()`/`rgba()` stops of a
/// `linear-gradient(...)`, in source order.
pub(crate) fn gradient_stops(value: &str) -> Option<(Color, Color)> {
    if !value.trim_start().starts_with("linear-gradient(") {
        return None;
    }

    let mut stops = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find("rgb") {
        let candidate = &rest[start..];
        let end = candidate.find(')')?;
        if let Some(color) = parse_rgb_function(&candidate[..=end]) {
            stops.push(color);
        }
        rest = &candidate[end + 1..];
    }

    Some((*stops.first()?, *stops.last()?))
}
