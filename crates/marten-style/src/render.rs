//! The styled render tree.
//!
//! [§ 3 The CSS box model](https://www.w3.org/TR/css-box-3/)
//!
//! One [`RenderNode`] per element and text node of the document, each with
//! its fully cascaded style. Nodes live in an arena owned by [`RenderTree`]
//! and refer to each other by [`RenderId`]; [`NodeRef`] pairs an id with its
//! tree for navigation and length queries.

use marten_css::StylesheetParser;
use marten_dom::{DomTree, NodeId, NodeType};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::cascade::{self, NodeMap};
use crate::declaration::StyleMap;
use crate::error::{StyleError, ValueError};
use crate::length::{self, Edges, ResolutionContext, StyleTree};

/// Index of a node in its [`RenderTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RenderId(pub usize);

/// What a render node was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// An element.
    Element,
    /// A run of text.
    Text,
}

/// One styled node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    /// Element or text.
    pub kind: NodeKind,
    /// Lowercased tag name; empty for text.
    pub tag: String,
    /// Text content, after [`filter_text`]; empty for elements.
    pub text: String,
    /// Attributes in source order.
    pub attributes: Vec<(String, String)>,
    /// Resolved style.
    pub style: StyleMap,
    /// Whether layout may wrap this node's text across lines.
    pub wrappable: bool,
    /// Children in document order.
    pub children: Vec<RenderId>,
    /// Enclosing node, `None` at the root.
    pub parent: Option<RenderId>,
    /// The document node this was built from. `None` for text installed by
    /// [`RenderTree::set_text`].
    pub source: Option<NodeId>,
}

/// A styled tree, rooted at [`RenderTree::root`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTree {
    nodes: Vec<RenderNode>,
    context: ResolutionContext,
}

impl RenderTree {
    /// Build the render tree for the subtree of `doc` rooted at `root`.
    ///
    /// `matched` holds the collapsed stylesheet declarations per document
    /// node; `parser` reads `style` attributes. Comments are skipped.
    ///
    /// # Errors
    ///
    /// [`StyleError::MissingRoot`] if `root` is not an element or text node.
    pub fn build<P: StylesheetParser>(
        doc: &DomTree,
        root: NodeId,
        matched: &NodeMap,
        parser: &P,
        context: ResolutionContext,
    ) -> Result<Self, StyleError> {
        let mut tree = Self {
            nodes: Vec::new(),
            context,
        };

        if !matches!(
            doc.get(root).map(|node| &node.node_type),
            Some(NodeType::Element(_) | NodeType::Text(_))
        ) {
            return Err(StyleError::MissingRoot);
        }

        // Preorder walk; children are pushed reversed so they come off the
        // stack in document order.
        let mut stack = vec![(root, None)];
        while let Some((dom_id, parent)) = stack.pop() {
            let Some(id) = tree.build_node(doc, dom_id, parent, matched, parser) else {
                continue;
            };
            stack.extend(doc.children(dom_id).iter().rev().map(|&child| (child, Some(id))));
        }

        log::debug!(target: "marten", "built {} render nodes", tree.nodes.len());
        Ok(tree)
    }

    fn build_node<P: StylesheetParser>(
        &mut self,
        doc: &DomTree,
        dom_id: NodeId,
        parent: Option<RenderId>,
        matched: &NodeMap,
        parser: &P,
    ) -> Option<RenderId> {
        let empty = StyleMap::new();
        let parent_style = parent.map_or(&empty, |p| &self.nodes[p.0].style);
        let matched = matched.get(&dom_id);

        let node = match &doc.get(dom_id)?.node_type {
            NodeType::Element(element) => RenderNode {
                kind: NodeKind::Element,
                tag: element.tag_name.to_lowercase(),
                text: String::new(),
                attributes: element.attrs.clone(),
                style: cascade::resolve(
                    parent_style,
                    matched,
                    &cascade::inline_declarations(parser, element),
                ),
                wrappable: element.tag_name.eq_ignore_ascii_case("span"),
                children: Vec::new(),
                parent,
                source: Some(dom_id),
            },
            NodeType::Text(text) => RenderNode {
                kind: NodeKind::Text,
                tag: String::new(),
                text: filter_text(text),
                attributes: Vec::new(),
                style: text_style(parent_style, matched),
                wrappable: true,
                children: Vec::new(),
                parent,
                source: Some(dom_id),
            },
            NodeType::Comment(_) | NodeType::Document => return None,
        };

        Some(self.push(node))
    }

    fn push(&mut self, node: RenderNode) -> RenderId {
        let id = RenderId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }

    /// The root node.
    #[must_use]
    pub const fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: RenderId(0),
        }
    }

    /// A view of node `id`, if it belongs to this tree.
    #[must_use]
    pub fn node(&self, id: RenderId) -> Option<NodeRef<'_>> {
        (id.0 < self.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// The raw node data for `id`.
    #[must_use]
    pub fn get(&self, id: RenderId) -> Option<&RenderNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes reachable from the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root().descendants().count()
    }

    /// Returns `true` if the tree has no nodes, which a built tree never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The context lengths in this tree resolve against.
    #[must_use]
    pub const fn context(&self) -> &ResolutionContext {
        &self.context
    }

    /// Replace the content of `id` with the single text run `text`.
    ///
    /// An existing lone text child is updated in place. Otherwise the
    /// children are detached and a new text child is installed, styled by
    /// inheritance from `id` alone.
    pub fn set_text(&mut self, id: RenderId, text: &str) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };

        let lone_text = match node.children[..] {
            [only] if self.nodes[only.0].kind == NodeKind::Text => Some(only),
            _ => None,
        };
        if let Some(only) = lone_text {
            self.nodes[only.0].text = text.to_string();
            return;
        }

        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        let style = text_style(&self.nodes[id.0].style, None);
        let _ = self.push(RenderNode {
            kind: NodeKind::Text,
            tag: String::new(),
            text: text.to_string(),
            attributes: Vec::new(),
            style,
            wrappable: true,
            children: Vec::new(),
            parent: Some(id),
            source: None,
        });
    }
}

impl Serialize for RenderTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}

/// Resolved style of a text run: inherited and matched declarations, then
/// `display: inline` regardless of either.
fn text_style(parent: &StyleMap, matched: Option<&StyleMap>) -> StyleMap {
    let mut style = cascade::resolve(parent, matched, &StyleMap::new());
    style.set_css("display", "inline");
    style
}

/// Normalize text content: soft hyphens (U+00AD) are removed and each tab
/// becomes four spaces.
#[must_use]
pub fn filter_text(text: &str) -> String {
    text.replace('\u{ad}', "").replace('\t', "    ")
}

/// A node together with the tree it lives in.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a RenderTree,
    id: RenderId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'a> NodeRef<'a> {
    fn data(self) -> &'a RenderNode {
        &self.tree.nodes[self.id.0]
    }

    fn wrap(self, id: RenderId) -> Self {
        Self {
            tree: self.tree,
            id,
        }
    }

    /// This node's id.
    #[must_use]
    pub const fn id(self) -> RenderId {
        self.id
    }

    /// The full node data.
    #[must_use]
    pub fn node(self) -> &'a RenderNode {
        self.data()
    }

    /// Element or text.
    #[must_use]
    pub fn kind(self) -> NodeKind {
        self.data().kind
    }

    /// Lowercased tag name, empty for text.
    #[must_use]
    pub fn tag(self) -> &'a str {
        &self.data().tag
    }

    /// Text content, empty for elements.
    #[must_use]
    pub fn text(self) -> &'a str {
        &self.data().text
    }

    /// Value of attribute `name`.
    #[must_use]
    pub fn attr(self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if attribute `name` is present.
    #[must_use]
    pub fn has_attr(self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Resolved style.
    #[must_use]
    pub fn resolved_style(self) -> &'a StyleMap {
        &self.data().style
    }

    /// Children in document order.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> {
        self.data().children.iter().map(move |&id| self.wrap(id))
    }

    /// Enclosing node.
    #[must_use]
    pub fn parent_node(self) -> Option<Self> {
        self.data().parent.map(|id| self.wrap(id))
    }

    /// This node and everything under it, in document order.
    pub fn descendants(self) -> impl Iterator<Item = NodeRef<'a>> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
            Some(node)
        })
    }

    /// First node under this one (not this one) with tag `tag`, depth-first.
    #[must_use]
    pub fn find_first_descendant(self, tag: &str) -> Option<Self> {
        self.descendants().skip(1).find(|node| node.tag() == tag)
    }

    /// All nodes under this one with tag `tag`, in document order, including
    /// matches nested inside other matches.
    #[must_use]
    pub fn find_all_descendants(self, tag: &str) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter(|node| node.tag() == tag)
            .collect()
    }

    /// This node or its closest ancestor with tag `tag`.
    #[must_use]
    pub fn nearest_ancestor(self, tag: &str) -> Option<Self> {
        std::iter::successors(Some(self), |node| node.parent_node()).find(|node| node.tag() == tag)
    }

    /// Selector-like segment for this node alone: `#id` (dots escaped) or
    /// `tag:nth-child(k)` with `k` counting element siblings from 1.
    fn ref_segment(self) -> Option<String> {
        if self.kind() != NodeKind::Element {
            return None;
        }
        if let Some(id) = self.attr("id").filter(|id| !id.is_empty()) {
            return Some(format!("#{}", id.replace('.', "\\.")));
        }

        let Some(parent) = self.parent_node() else {
            return Some(self.tag().to_string());
        };
        let position = 1 + parent
            .children()
            .take_while(|sibling| sibling.id != self.id)
            .filter(|sibling| sibling.kind() == NodeKind::Element)
            .count();
        Some(format!("{}:nth-child({position})", self.tag()))
    }

    /// A selector-like path to this node for diagnostics.
    ///
    /// Segments are joined with ` > ` from the outermost ancestor below
    /// `body` down to this node. The walk stops early at an ancestor with an
    /// `id`. Not guaranteed to select only this node.
    #[must_use]
    pub fn query_ref(self) -> String {
        let own = self.ref_segment();
        if let Some(own) = own.as_ref().filter(|own| own.contains('#')) {
            return own.clone();
        }

        let mut path: Vec<String> = own.into_iter().collect();
        for ancestor in std::iter::successors(self.parent_node(), |node| node.parent_node()) {
            if matches!(ancestor.tag(), "html" | "body") {
                continue;
            }
            if let Some(segment) = ancestor.ref_segment() {
                let anchored = segment.contains('#');
                path.insert(0, segment);
                if anchored {
                    break;
                }
            }
        }
        path.join(" > ")
    }

    /// Returns `true` if this node carries text, or every child does.
    #[must_use]
    pub fn is_pure_text_content(self) -> bool {
        !self.text().is_empty() || self.children().all(|child| !child.text().is_empty())
    }

    /// Visible text runs of this subtree, skipping `display: none` subtrees.
    /// Runs are trimmed and empty ones dropped unless `pre` is set.
    #[must_use]
    pub fn content(self, pre: bool) -> Vec<&'a str> {
        let mut runs = Vec::new();
        self.collect_content(pre, &mut runs);
        runs
    }

    fn collect_content(self, pre: bool, runs: &mut Vec<&'a str>) {
        if self.kind() == NodeKind::Text && !self.resolved_style().is_display_none() {
            let text = if pre { self.text() } else { self.text().trim() };
            if !text.is_empty() {
                runs.push(text);
            }
        }
        for child in self.children() {
            if !child.resolved_style().is_display_none() {
                child.collect_content(pre, runs);
            }
        }
    }

    /// [`content`](Self::content) joined: raw when `pre`, otherwise with
    /// single spaces and trimmed.
    #[must_use]
    pub fn content_string(self, pre: bool) -> String {
        let runs = self.content(pre);
        if pre {
            runs.concat()
        } else {
            runs.join(" ").trim().to_string()
        }
    }

    /// Used width, see [`length::width`].
    #[must_use]
    pub fn width(self) -> f64 {
        length::width(self, &self.tree.context)
    }

    /// Declared height, see [`length::height`].
    #[must_use]
    pub fn height(self) -> f64 {
        length::height(self, &self.tree.context)
    }

    /// Width children's percentages resolve against.
    #[must_use]
    pub fn base_width(self) -> f64 {
        length::base_width(self, &self.tree.context)
    }

    /// Pixel value of `property`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Fails when the declared value is not a length.
    pub fn css_px(self, property: &str) -> Result<Option<f64>, ValueError> {
        length::css_px(self, property, &self.tree.context)
    }

    /// Box edges of a shorthand such as `margin` or `padding`.
    ///
    /// # Errors
    ///
    /// Fails when a shorthand token is not a length.
    pub fn edges(self, key: &str) -> Result<Edges, ValueError> {
        length::edges(self, key, &self.tree.context)
    }
}

impl StyleTree for NodeRef<'_> {
    fn parent(&self) -> Option<Self> {
        self.parent_node()
    }

    fn style(&self) -> &StyleMap {
        &self.tree.nodes[self.id.0].style
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let node = self.data();
        let mut state = serializer.serialize_struct("RenderNode", 6)?;
        state.serialize_field("kind", &node.kind)?;
        state.serialize_field("tag", &node.tag)?;
        state.serialize_field("text", &node.text)?;
        state.serialize_field("attributes", &node.attributes)?;
        state.serialize_field("style", &node.style)?;
        state.serialize_field("children", &self.children().collect::<Vec<_>>())?;
        state.end()
    }
}
