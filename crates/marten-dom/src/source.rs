//! Interchange format for documents produced by an external markup parser.
//!
//! A [`SourceNode`] is a plain nested tree that serializes to JSON like:
//!
//! ```json
//! { "type": "element", "tag": "p", "attrs": [["class", "note"]],
//!   "children": [{ "type": "text", "text": "hello" }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::{DomTree, ElementData, NodeId, NodeType};

/// One node of a nested document description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceNode {
    /// The document node. Only valid at the top of a description.
    Document {
        /// Top-level children, usually a single `html` element.
        #[serde(default)]
        children: Vec<SourceNode>,
    },
    /// An element with its attributes in source order.
    Element {
        /// Tag name as written by the parser.
        tag: String,
        /// Attribute `(name, value)` pairs.
        #[serde(default)]
        attrs: Vec<(String, String)>,
        /// Child nodes in document order.
        #[serde(default)]
        children: Vec<SourceNode>,
    },
    /// A text run.
    Text {
        /// Literal text content.
        text: String,
    },
    /// A comment. Kept in the tree, never rendered.
    Comment {
        /// Comment body.
        text: String,
    },
}

impl SourceNode {
    /// Shorthand for an element without attributes.
    pub fn element(tag: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children,
        }
    }

    /// Shorthand for an element with attributes.
    pub fn element_with(
        tag: impl Into<String>,
        attrs: &[(&str, &str)],
        children: Vec<Self>,
    ) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            children,
        }
    }

    /// Shorthand for a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

impl DomTree {
    /// Build an arena tree from a nested description.
    ///
    /// A top-level [`SourceNode::Document`] becomes the tree's document node;
    /// any other top-level node is appended as the document's only child.
    #[must_use]
    pub fn from_source(source: &SourceNode) -> Self {
        let mut tree = Self::new();
        match source {
            SourceNode::Document { children } => {
                for child in children {
                    tree.append_source(NodeId::ROOT, child);
                }
            }
            other => tree.append_source(NodeId::ROOT, other),
        }
        tree
    }

    /// Append a nested description under `parent`, depth first.
    pub fn append_source(&mut self, parent: NodeId, source: &SourceNode) {
        match source {
            // A nested document node has no meaning; splice its children in.
            SourceNode::Document { children } => {
                for child in children {
                    self.append_source(parent, child);
                }
            }
            SourceNode::Element {
                tag,
                attrs,
                children,
            } => {
                let id = self.append(
                    parent,
                    NodeType::Element(ElementData {
                        tag_name: tag.clone(),
                        attrs: attrs.clone(),
                    }),
                );
                for child in children {
                    self.append_source(id, child);
                }
            }
            SourceNode::Text { text } => {
                let _ = self.append(parent, NodeType::Text(text.clone()));
            }
            SourceNode::Comment { text } => {
                let _ = self.append(parent, NodeType::Comment(text.clone()));
            }
        }
    }
}
