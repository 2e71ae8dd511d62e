//! In-memory page tree
//!
//! Arena-backed stand-in for the DOM. Detached nodes stay in the arena but
//! are unreachable from the body.

use super::{ElementInfo, NodeKind, PageTree, Segment};
use crate::error::{Error, Result};

/// Index into the page arena.
///
/// Only meaningful for the page that issued it; ids from another page are
/// treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Data {
    Text(String),
    Element(ElementInfo),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    data: Data,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemoryPage {
    nodes: Vec<NodeData>,
    body: NodeId,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// Page with an empty `<body>`
    pub fn new() -> Self {
        let body = NodeData {
            data: Data::Element(ElementInfo::new("body", &[])),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
        }
    }

    /// Page with one `<p>` per line of `text`
    pub fn from_paragraphs(text: &str) -> Self {
        let mut page = Self::new();
        let body = page.body;
        for line in text.lines() {
            let p = page.append_element(body, "p", &[]);
            if !line.is_empty() {
                page.append_text(p, line);
            }
        }
        page
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str, classes: &[&str]) -> NodeId {
        self.push(parent, Data::Element(ElementInfo::new(tag, classes)))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, Data::Text(text.to_string()))
    }

    pub fn append_comment(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, Data::Comment(text.to_string()))
    }

    /// Serialize a subtree as HTML-ish markup, for assertions and previews
    pub fn markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    /// Markup of the body's children
    pub fn body_markup(&self) -> String {
        self.nodes[self.body.0]
            .children
            .iter()
            .map(|&child| self.markup(child))
            .collect()
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].data {
            Data::Text(text) => {
                for ch in text.chars() {
                    match ch {
                        '<' => out.push_str("&lt;"),
                        '>' => out.push_str("&gt;"),
                        '&' => out.push_str("&amp;"),
                        _ => out.push(ch),
                    }
                }
            }
            Data::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Data::Element(info) => {
                let tag = info.tag.to_ascii_lowercase();
                out.push('<');
                out.push_str(&tag);
                if !info.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&info.classes.join(" "));
                    out.push('"');
                }
                out.push('>');
                for &child in &self.nodes[node.0].children {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }

    fn push(&mut self, parent: NodeId, data: Data) -> NodeId {
        let id = self.alloc(data);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: &NodeId) -> Result<&NodeData> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| Error::dom(format!("unknown node {}", id.0)))
    }

    fn alloc(&mut self, data: Data) -> NodeId {
        self.nodes.push(NodeData {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Replace `node` in its parent's child list with `replacements`
    fn replace_with(&mut self, node: NodeId, replacements: Vec<NodeId>) -> Result<()> {
        let parent = self
            .node(&node)?
            .parent
            .ok_or_else(|| Error::dom("node has no parent"))?;
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == node)
            .ok_or_else(|| Error::dom("node missing from parent"))?;

        for &r in &replacements {
            self.nodes[r.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(index..=index, replacements);
        self.nodes[node.0].parent = None;
        Ok(())
    }
}

impl PageTree for MemoryPage {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn kind(&self, node: &NodeId) -> NodeKind {
        match self.node(node).map(|n| &n.data) {
            Ok(Data::Text(text)) => NodeKind::Text(text.clone()),
            Ok(Data::Element(info)) => NodeKind::Element(info.clone()),
            Ok(Data::Comment(_)) | Err(_) => NodeKind::Other,
        }
    }

    fn children(&self, node: &NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.node(node).ok().and_then(|n| n.parent)
    }

    fn splice_text(&mut self, node: &NodeId, segments: &[Segment], marker_class: &str) -> Result<()> {
        if !matches!(self.node(node)?.data, Data::Text(_)) {
            return Err(Error::dom("splice target is not a text node"));
        }

        let mut replacements = Vec::with_capacity(segments.len());
        for segment in segments {
            match segment {
                Segment::Plain(text) if text.is_empty() => {}
                Segment::Plain(text) => replacements.push(self.alloc(Data::Text(text.clone()))),
                Segment::Marked(text) => {
                    let span = self.alloc(Data::Element(ElementInfo::new("span", &[marker_class])));
                    let inner = self.alloc(Data::Text(text.clone()));
                    self.nodes[inner.0].parent = Some(span);
                    self.nodes[span.0].children.push(inner);
                    replacements.push(span);
                }
            }
        }
        self.replace_with(*node, replacements)
    }

    fn unwrap_element(&mut self, node: &NodeId) -> Result<()> {
        let text = self.text_content(node);
        let replacement = self.alloc(Data::Text(text));
        self.replace_with(*node, vec![replacement])
    }

    fn normalize(&mut self, node: &NodeId) -> Result<()> {
        self.node(node)?;
        let children = std::mem::take(&mut self.nodes[node.0].children);
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());

        for child in children {
            let child_text = match &self.nodes[child.0].data {
                Data::Text(text) => Some(text.clone()),
                _ => None,
            };
            match child_text {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                }
                Some(text) => {
                    let prev_text = merged
                        .last()
                        .copied()
                        .filter(|prev| matches!(self.nodes[prev.0].data, Data::Text(_)));
                    if let Some(prev) = prev_text {
                        if let Data::Text(existing) = &mut self.nodes[prev.0].data {
                            existing.push_str(&text);
                        }
                        self.nodes[child.0].parent = None;
                    } else {
                        merged.push(child);
                    }
                }
                None => {
                    self.normalize(&child)?;
                    merged.push(child);
                }
            }
        }

        self.nodes[node.0].children = merged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paragraphs() {
        let page = MemoryPage::from_paragraphs("one\n\ntwo");
        assert_eq!(page.body_markup(), "<p>one</p><p></p><p>two</p>");
    }

    #[test]
    fn test_splice_text_preserves_order() {
        let mut page = MemoryPage::new();
        let p = page.append_element(page.body_id(), "p", &[]);
        let text = page.append_text(p, "a cat sat");
        page.append_text(p, "!");

        page.splice_text(
            &text,
            &[
                Segment::Plain("a ".into()),
                Segment::Marked("cat".into()),
                Segment::Plain(" sat".into()),
            ],
            "hl",
        )
        .unwrap();

        assert_eq!(page.markup(p), "<p>a <span class=\"hl\">cat</span> sat!</p>");
        assert_eq!(page.children(&p).len(), 4);
        assert_eq!(page.parent(&text), None);
    }

    #[test]
    fn test_splice_rejects_elements() {
        let mut page = MemoryPage::new();
        let p = page.append_element(page.body_id(), "p", &[]);
        assert!(page.splice_text(&p, &[], "hl").is_err());
    }

    #[test]
    fn test_foreign_node_ids_are_absent() {
        let mut big = MemoryPage::from_paragraphs("one\ntwo\nthree");
        let stranger = big.append_text(big.body_id(), "late");
        let mut page = MemoryPage::new();

        assert_eq!(page.kind(&stranger), NodeKind::Other);
        assert!(page.children(&stranger).is_empty());
        assert_eq!(page.parent(&stranger), None);
        assert!(page.splice_text(&stranger, &[], "hl").is_err());
        assert!(page.unwrap_element(&stranger).is_err());
        assert!(page.normalize(&stranger).is_err());
        assert_eq!(page.body_markup(), "");
    }

    #[test]
    fn test_unwrap_and_normalize() {
        let mut page = MemoryPage::new();
        let p = page.append_element(page.body_id(), "p", &[]);
        page.append_text(p, "a ");
        let span = page.append_element(p, "span", &["hl"]);
        page.append_text(span, "cat");
        page.append_text(p, " sat");

        page.unwrap_element(&span).unwrap();
        assert_eq!(page.children(&p).len(), 3);

        page.normalize(&p).unwrap();
        let children = page.children(&p);
        assert_eq!(children.len(), 1);
        assert_eq!(page.kind(&children[0]), NodeKind::Text("a cat sat".into()));
    }

    #[test]
    fn test_normalize_drops_empty_text_and_recurses() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let div = page.append_element(body, "div", &[]);
        page.append_text(div, "");
        page.append_text(div, "x");
        page.append_text(div, "y");
        page.append_comment(body, "note");

        page.normalize(&body).unwrap();
        assert_eq!(page.children(&div).len(), 1);
        assert_eq!(page.body_markup(), "<div>xy</div><!--note-->");
    }

    #[test]
    fn test_text_content_skips_comments() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        page.append_text(body, "a");
        page.append_comment(body, "hidden");
        let b = page.append_element(body, "b", &[]);
        page.append_text(b, "<b>");
        assert_eq!(page.text_content(&body), "a<b>");
        assert_eq!(page.body_markup(), "a<!--hidden--><b>&lt;b&gt;</b>");
    }
}
