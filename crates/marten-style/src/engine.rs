//! The resolution pipeline.
//!
//! [`StyleEngine`] holds everything one resolution run needs: viewport, base
//! font size, font inventory and cache, and the stylesheet parser and selector
//! engine it delegates to. Engines never share resolution state unless
//! handed the same [`FontCache`].
//!
//! Warning deduplication is the exception: the set of reported messages in
//! [`marten_common::warning`] is process-wide, shared by every engine, and
//! cleared at the start of each [`StyleEngine::resolve`]. A message seen
//! during one engine's run may be reported again after another engine starts
//! a run.

use std::fmt;
use std::sync::Arc;

use marten_common::warning::{clear_warnings, warn_once};
use marten_css::{
    CssParser, ParseError, SelectorEngine, SelectorMatcher, Stylesheet, StylesheetParser,
    add_on_stylesheet,
};
use marten_dom::{DomTree, NodeId};

use crate::cascade::{self, NodeMap};
use crate::declaration::StyleMap;
use crate::error::StyleError;
use crate::font::{self, FontCache, FontMetrics, FontOpener};
use crate::length::{DEFAULT_BASE_FONT_SIZE, ResolutionContext, Viewport};
use crate::matcher;
use crate::query;
use crate::render::RenderTree;

/// Configuration and shared state for resolving documents.
///
/// Warnings are deduplicated per process, not per engine; see the module
/// docs.
pub struct StyleEngine<P = CssParser, S = SelectorMatcher> {
    viewport: Viewport,
    base_font_size: f64,
    fonts: Vec<String>,
    font_sizes: Vec<u32>,
    font_opener: Option<Box<dyn FontOpener + Send + Sync>>,
    font_cache: Arc<FontCache>,
    parser: P,
    selectors: S,
    use_add_on: bool,
}

impl StyleEngine {
    /// An engine with the built-in parser and selector matcher, a 1280×1080
    /// viewport, an 11px base font size and no font inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(CssParser, SelectorMatcher)
    }
}

impl Default for StyleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S> fmt::Debug for StyleEngine<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleEngine")
            .field("viewport", &self.viewport)
            .field("base_font_size", &self.base_font_size)
            .field("fonts", &self.fonts)
            .field("font_sizes", &self.font_sizes)
            .field("font_opener", &self.font_opener.is_some())
            .field("use_add_on", &self.use_add_on)
            .finish_non_exhaustive()
    }
}

impl<P: StylesheetParser, S: SelectorEngine> StyleEngine<P, S> {
    /// An engine using `parser` for stylesheets and `style` attributes and
    /// `selectors` for matching.
    #[must_use]
    pub fn with_collaborators(parser: P, selectors: S) -> Self {
        Self {
            viewport: Viewport::default(),
            base_font_size: DEFAULT_BASE_FONT_SIZE,
            fonts: Vec::new(),
            font_sizes: Vec::new(),
            font_opener: None,
            font_cache: Arc::new(FontCache::new()),
            parser,
            selectors,
            use_add_on: true,
        }
    }

    /// Set the viewport.
    #[must_use]
    pub const fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the pixel size of `1em`.
    #[must_use]
    pub const fn with_base_font_size(mut self, size: f64) -> Self {
        self.base_font_size = size;
        self
    }

    /// Set the installed font family names.
    #[must_use]
    pub fn with_fonts(mut self, fonts: Vec<String>) -> Self {
        self.fonts = fonts;
        self
    }

    /// Set the pixel sizes fonts are available in.
    #[must_use]
    pub fn with_font_sizes(mut self, sizes: Vec<u32>) -> Self {
        self.font_sizes = sizes;
        self
    }

    /// Set how fonts are opened.
    #[must_use]
    pub fn with_font_opener(mut self, opener: impl FontOpener + Send + Sync + 'static) -> Self {
        self.font_opener = Some(Box::new(opener));
        self
    }

    /// Share a font cache with other engines.
    #[must_use]
    pub fn with_font_cache(mut self, cache: Arc<FontCache>) -> Self {
        self.font_cache = cache;
        self
    }

    /// Whether the add-on user-agent stylesheet runs before author sheets.
    /// On by default.
    #[must_use]
    pub const fn with_add_on_stylesheet(mut self, enabled: bool) -> Self {
        self.use_add_on = enabled;
        self
    }

    /// Parameters lengths are resolved with.
    #[must_use]
    pub const fn context(&self) -> ResolutionContext {
        ResolutionContext {
            viewport: self.viewport,
            base_font_size: self.base_font_size,
        }
    }

    /// The font cache.
    #[must_use]
    pub fn font_cache(&self) -> &Arc<FontCache> {
        &self.font_cache
    }

    fn match_sheet(&self, doc: &DomTree, sheet: &Stylesheet) -> NodeMap {
        let rules = matcher::match_rules(&self.selectors, doc, sheet, &self.context());
        cascade::node_map(&rules)
    }

    /// Match a single stylesheet against `doc`.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] if `css` does not parse.
    pub fn match_stylesheet(&self, doc: &DomTree, css: &str) -> Result<NodeMap, ParseError> {
        let sheet = self.parser.parse_stylesheet(css)?;
        log::info!(target: "marten", "parsed {} rules", sheet.rules.len());
        Ok(self.match_sheet(doc, &sheet))
    }

    /// Match the add-on sheet (if enabled) and then every sheet of `sheets`,
    /// merging the results in that order. A sheet that fails to parse is
    /// logged and skipped.
    #[must_use]
    pub fn match_stylesheets<T: AsRef<str>>(&self, doc: &DomTree, sheets: &[T]) -> NodeMap {
        let mut node_map = NodeMap::new();

        if self.use_add_on {
            match add_on_stylesheet() {
                Ok(sheet) => node_map = self.match_sheet(doc, sheet),
                Err(err) => warn_once("CSS", &format!("add-on stylesheet: {err}")),
            }
        }

        for (index, css) in sheets.iter().enumerate() {
            match self.match_stylesheet(doc, css.as_ref()) {
                Ok(matched) => cascade::merge_node_maps(&mut node_map, matched),
                Err(err) => warn_once("CSS", &format!("skipping stylesheet {index}: {err}")),
            }
        }
        node_map
    }

    /// Build the render tree below `root` from already matched declarations.
    ///
    /// # Errors
    ///
    /// [`StyleError::MissingRoot`] if `root` is not an element or text node.
    pub fn build(&self, doc: &DomTree, root: NodeId, node_map: &NodeMap) -> Result<RenderTree, StyleError> {
        RenderTree::build(doc, root, node_map, &self.parser, self.context())
    }

    /// Resolve `doc` against `sheets` into a render tree rooted at `<body>`,
    /// or at the document element when there is no body.
    ///
    /// Every call is a fresh run; nothing carries over from an earlier tree.
    /// This includes the process-wide warning set, which is cleared first.
    ///
    /// # Errors
    ///
    /// [`StyleError::MissingRoot`] if the document has no element.
    pub fn resolve<T: AsRef<str>>(&self, doc: &DomTree, sheets: &[T]) -> Result<RenderTree, StyleError> {
        clear_warnings();

        let root = doc
            .body()
            .or_else(|| doc.document_element())
            .ok_or(StyleError::MissingRoot)?;
        let node_map = self.match_stylesheets(doc, sheets);
        log::debug!(target: "marten", "{} nodes matched stylesheet rules", node_map.len());

        let tree = self.build(doc, root, &node_map)?;
        log::info!(target: "marten", "resolved {} render nodes", tree.len());
        Ok(tree)
    }

    /// Pick a font family from the inventory, see
    /// [`query::preferred_font_name`].
    #[must_use]
    pub fn preferred_font_name<'a>(&'a self, preferences: &'a [String]) -> Option<&'a str> {
        query::preferred_font_name(preferences, &self.fonts)
    }

    /// Metrics of the font for `style`, opened through the font opener and
    /// cached by file name. `None` without an opener or when the open fails.
    #[must_use]
    pub fn font(&self, style: &StyleMap) -> Option<Arc<FontMetrics>> {
        let opener = self.font_opener.as_deref()?;
        let preferences = style.font_family_preferences();
        let family = self.preferred_font_name(&preferences)?;
        let size = font::closest_font_size(style.font_size(self.base_font_size), &self.font_sizes);
        let name = font::font_file_name(family, size);

        let font = self.font_cache.get_or_open(&name, opener);
        if font.is_none() {
            warn_once("font", &format!("could not open {name}"));
        }
        font
    }

    /// Line height for `style` in pixels: the opened font's height, or
    /// 1.2 times the font size when no font is available.
    #[must_use]
    pub fn font_height(&self, style: &StyleMap) -> f64 {
        self.font(style)
            .map_or_else(|| style.font_size(self.base_font_size) * 1.2, |font| font.height)
    }
}
