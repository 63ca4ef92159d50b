//! Font selection and the font-handle cache.
//!
//! [§ 10.8 Line height calculations](https://www.w3.org/TR/CSS2/visudet.html#line-height)
//!
//! "CSS assumes that every font has font metrics that specify a
//! characteristic height above the baseline and a depth below it."
//!
//! Opening fonts is left to a [`FontOpener`] supplied by the embedder. This
//! module only decides which file to ask for and remembers the answer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// Vertical metrics of an opened font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontMetrics {
    /// Line height of the font.
    pub height: f64,
    /// Distance from the top of the line to the baseline.
    pub ascent: f64,
}

/// Opens a font by file name.
pub trait FontOpener {
    /// Metrics of the font stored under `name`, or `None` if it cannot be
    /// opened.
    fn open(&self, name: &str) -> Option<FontMetrics>;
}

impl<F> FontOpener for F
where
    F: Fn(&str) -> Option<FontMetrics>,
{
    fn open(&self, name: &str) -> Option<FontMetrics> {
        self(name)
    }
}

/// Opened fonts keyed by file name.
///
/// Safe to share between engines. The first successful open for a name is
/// kept; a later open of the same name returns the cached handle.
#[derive(Debug, Default)]
pub struct FontCache {
    fonts: Mutex<HashMap<String, Arc<FontMetrics>>>,
}

impl FontCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached font for `name`, opening it through `opener` on a miss.
    ///
    /// Failed opens are not cached.
    #[must_use]
    pub fn get_or_open(&self, name: &str, opener: &dyn FontOpener) -> Option<Arc<FontMetrics>> {
        if let Some(font) = self.get(name) {
            return Some(font);
        }

        log::info!(target: "marten", "opening font {name}");
        let opened = Arc::new(opener.open(name)?);

        let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
        Some(Arc::clone(fonts.entry(name.to_string()).or_insert(opened)))
    }

    /// The cached font for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<FontMetrics>> {
        self.fonts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Number of cached fonts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fonts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing has been opened yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The available pixel size nearest to `desired`. Ties go to the size listed
/// first.
#[must_use]
pub fn closest_font_size(desired: f64, available: &[u32]) -> Option<u32> {
    available.iter().copied().fold(None, |closest, size| match closest {
        Some(best) if (f64::from(best) - desired).abs() <= (f64::from(size) - desired).abs() => {
            Some(best)
        }
        _ => Some(size),
    })
}

/// File name a font is opened under: `<family>/<size>`, or just the family
/// when no sizes are known. A family that already ends in `/` is not given a
/// second one.
#[must_use]
pub fn font_file_name(family: &str, size: Option<u32>) -> String {
    match size {
        Some(size) => format!("{}/{size}", family.trim_end_matches('/')),
        None => family.to_string(),
    }
}
