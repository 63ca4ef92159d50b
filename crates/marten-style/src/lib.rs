//! Cascade and box-model resolution.
//!
//! Turns a [`marten_dom::DomTree`] plus stylesheets into a [`RenderTree`]
//! of styled nodes, and answers length, color and display queries on the
//! result.
//!
//! # Pipeline
//!
//! 1. [`matcher`] runs each stylesheet's rules through the selector engine,
//!    expanding media blocks that hold for the viewport.
//! 2. [`cascade`] collapses each node's matched rules and layers inherited,
//!    matched and inline declarations.
//! 3. [`render`] walks the document once, building the styled tree.
//! 4. [`query`] and [`length`] read values back out.
//!
//! [`StyleEngine`] wires these together.
//!
//! # Example
//!
//! ```
//! use marten_dom::{DomTree, SourceNode};
//! use marten_style::StyleEngine;
//!
//! let doc = DomTree::from_source(&SourceNode::element(
//!     "html",
//!     vec![SourceNode::element(
//!         "body",
//!         vec![SourceNode::element("h1", vec![SourceNode::text("Hi")])],
//!     )],
//! ));
//! let tree = StyleEngine::new()
//!     .resolve(&doc, &["h1 { color: red }"])
//!     .unwrap();
//! let h1 = tree.root().find_first_descendant("h1").unwrap();
//! assert_eq!(h1.resolved_style().css("color"), "red");
//! ```

pub mod cascade;
pub mod color;
pub mod declaration;
pub mod engine;
pub mod error;
pub mod font;
pub mod length;
pub mod matcher;
pub mod query;
pub mod render;

pub use cascade::{NodeMap, apply_child_style, merge_node_maps};
pub use color::Color;
pub use declaration::{Declaration, StyleMap};
pub use engine::StyleEngine;
pub use error::{StyleError, ValueError};
pub use font::{FontCache, FontMetrics, FontOpener};
pub use length::{Edges, Length, ResolutionContext, StyleTree, Unit, Viewport};
pub use render::{NodeKind, NodeRef, RenderId, RenderNode, RenderTree};
