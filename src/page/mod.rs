//! Page tree abstraction
//!
//! The highlight manager only needs a handful of operations on the page: walk
//! elements and text nodes, replace a text node with a run of segments, and
//! unwrap a highlight element back into text. [`PageTree`] captures exactly
//! that, so the same logic drives the live DOM on wasm32 and [`MemoryPage`]
//! natively and in tests.

mod memory;

pub use memory::{MemoryPage, NodeId};

use crate::error::Result;

/// What a node is, as far as highlighting cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Text(String),
    Element(ElementInfo),
    /// Comments, processing instructions, etc.
    Other,
}

/// Tag and class list of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// Uppercase tag name, as `Element.tagName` reports for HTML
    pub tag: String,
    pub classes: Vec<String>,
}

impl ElementInfo {
    pub fn new(tag: &str, classes: &[&str]) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// A run of text in a rewritten text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Left as a bare text node
    Plain(String),
    /// Wrapped in a highlight element
    Marked(String),
}

/// Minimal mutable view of a document
pub trait PageTree {
    /// Cheap handle to a node
    type Node: Clone;

    /// Root of the walk (`document.body`)
    fn body(&self) -> Option<Self::Node>;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Replace a text node in place with the given segments, in order.
    ///
    /// Marked segments become elements carrying `marker_class`.
    fn splice_text(
        &mut self,
        node: &Self::Node,
        segments: &[Segment],
        marker_class: &str,
    ) -> Result<()>;

    /// Replace an element with a single text node holding its text content
    fn unwrap_element(&mut self, node: &Self::Node) -> Result<()>;

    /// Merge adjacent text children and drop empty ones (`Node.normalize`)
    fn normalize(&mut self, node: &Self::Node) -> Result<()>;

    /// Concatenated text of a subtree (`Node.textContent`)
    fn text_content(&self, node: &Self::Node) -> String {
        match self.kind(node) {
            NodeKind::Text(text) => text,
            NodeKind::Element(_) => self
                .children(node)
                .iter()
                .map(|child| self.text_content(child))
                .collect(),
            NodeKind::Other => String::new(),
        }
    }
}
