//! Live DOM adapters
//!
//! [`DomPage`] exposes the document body as a [`PageTree`]; [`DomProbe`]
//! answers resolver questions about one pointer position.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Node, Range, Window};

use super::js_message;
use crate::consts::{MESSAGE_CLASS, TOAST_FADE_MS, TOAST_SHOW_DELAY_MS};
use crate::controller::{PointerPosition, ToastKind};
use crate::error::{Error, Result};
use crate::page::{ElementInfo, NodeKind, PageTree, Segment};
use crate::resolver::{self, CaretText, HoverProbe};

// caretRangeFromPoint is WebKit/Blink, caretPositionFromPoint is Gecko;
// Range.expand is non-standard and may be missing entirely.
#[wasm_bindgen(inline_js = "
    export function caret_range_at(x, y) {
        if (document.caretRangeFromPoint) {
            return document.caretRangeFromPoint(x, y);
        }
        if (document.caretPositionFromPoint) {
            const pos = document.caretPositionFromPoint(x, y);
            if (!pos) return null;
            const range = document.createRange();
            range.setStart(pos.offsetNode, pos.offset);
            range.collapse(true);
            return range;
        }
        return null;
    }

    export function expand_to_word(range) {
        if (typeof range.expand !== 'function') {
            throw new Error('Range.expand is not supported');
        }
        range.expand('word');
    }
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn caret_range_at(x: f64, y: f64) -> std::result::Result<Option<Range>, JsValue>;

    #[wasm_bindgen(catch)]
    fn expand_to_word(range: &Range) -> std::result::Result<(), JsValue>;
}

fn dom_err(e: JsValue) -> Error {
    Error::dom(js_message(&e))
}

/// The current document as a page tree
pub struct DomPage {
    document: Document,
}

impl DomPage {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl PageTree for DomPage {
    type Node = Node;

    fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    fn kind(&self, node: &Node) -> NodeKind {
        match node.node_type() {
            Node::TEXT_NODE => NodeKind::Text(node.text_content().unwrap_or_default()),
            Node::ELEMENT_NODE => match node.dyn_ref::<Element>() {
                Some(el) => NodeKind::Element(ElementInfo {
                    tag: el.tag_name().to_ascii_uppercase(),
                    classes: el
                        .get_attribute("class")
                        .unwrap_or_default()
                        .split_whitespace()
                        .map(str::to_owned)
                        .collect(),
                }),
                None => NodeKind::Other,
            },
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let mut out = Vec::new();
        let mut child = node.first_child();
        while let Some(c) = child {
            child = c.next_sibling();
            out.push(c);
        }
        out
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn splice_text(&mut self, node: &Node, segments: &[Segment], marker_class: &str) -> Result<()> {
        let parent = node
            .parent_node()
            .ok_or_else(|| Error::dom("text node was detached"))?;

        for segment in segments {
            let replacement: Node = match segment {
                Segment::Plain(text) if text.is_empty() => continue,
                Segment::Plain(text) => self.document.create_text_node(text).into(),
                Segment::Marked(text) => {
                    let span = self.document.create_element("span").map_err(dom_err)?;
                    span.set_class_name(marker_class);
                    span.set_text_content(Some(text));
                    span.into()
                }
            };
            parent
                .insert_before(&replacement, Some(node))
                .map_err(dom_err)?;
        }
        parent.remove_child(node).map_err(dom_err)?;
        Ok(())
    }

    fn unwrap_element(&mut self, node: &Node) -> Result<()> {
        let parent = node
            .parent_node()
            .ok_or_else(|| Error::dom("highlight was detached"))?;
        let text = node.text_content().unwrap_or_default();
        let replacement = self.document.create_text_node(&text);
        parent.replace_child(&replacement, node).map_err(dom_err)?;
        Ok(())
    }

    fn normalize(&mut self, node: &Node) -> Result<()> {
        node.normalize();
        Ok(())
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }
}

/// Resolver probe for one pointer position
pub struct DomProbe {
    window: Window,
    target: Option<Element>,
    pos: PointerPosition,
}

impl DomProbe {
    pub fn new(window: &Window, document: &Document, pos: PointerPosition) -> Self {
        Self {
            window: window.clone(),
            target: document.element_from_point(pos.x as f32, pos.y as f32),
            pos,
        }
    }

    fn caret_range(&self) -> Option<Range> {
        caret_range_at(self.pos.x, self.pos.y).ok().flatten()
    }

    /// Expand a fresh caret range to a word, leaving `selection` as found
    fn expand_with_selection_restored(&self) -> std::result::Result<Option<String>, JsValue> {
        let Some(selection) = self.window.get_selection()? else {
            return Ok(None);
        };
        let saved = if selection.range_count() > 0 {
            Some(selection.get_range_at(0)?.clone_range())
        } else {
            None
        };

        selection.remove_all_ranges()?;
        let expanded = self.caret_range().map(|range| {
            expand_to_word(&range).map(|()| String::from(range.to_string()))
        });

        selection.remove_all_ranges()?;
        if let Some(range) = saved {
            selection.add_range(&range)?;
        }
        expanded.transpose()
    }
}

impl HoverProbe for DomProbe {
    fn target_excluded(&self) -> bool {
        let Some(target) = &self.target else {
            return true;
        };
        let tag = target.tag_name().to_ascii_uppercase();
        tag == "SCRIPT"
            || tag == "STYLE"
            || matches!(target.closest(&format!(".{MESSAGE_CLASS}")), Ok(Some(_)))
    }

    fn caret_text(&self) -> Option<CaretText> {
        let range = self.caret_range()?;
        let container = range.start_container().ok()?;
        if container.node_type() != Node::TEXT_NODE {
            return None;
        }
        let text = container.text_content()?;
        let utf16_offset = range.start_offset().ok()? as usize;
        let offset = resolver::utf16_to_byte_offset(&text, utf16_offset);
        Some(CaretText { text, offset })
    }

    fn element_text(&self) -> Option<String> {
        self.target.as_ref()?.text_content()
    }

    fn selection_word(&mut self) -> Option<String> {
        match self.expand_with_selection_restored() {
            Ok(word) => word,
            Err(e) => {
                log::debug!("Selection expand failed: {}", js_message(&e));
                None
            }
        }
    }
}

/// Show a transient toast at the bottom of the page
pub fn show_toast(window: &Window, document: &Document, text: &str, kind: ToastKind, duration_ms: u32) {
    let Some(body) = document.body() else {
        return;
    };
    let Ok(message) = document.create_element("div") else {
        return;
    };
    message.set_class_name(&format!("{MESSAGE_CLASS} {}", kind.as_class()));
    message.set_text_content(Some(text));
    if body.append_child(&message).is_err() {
        return;
    }

    {
        let message = message.clone();
        set_timeout(window, TOAST_SHOW_DELAY_MS, move || {
            let _ = message.class_list().add_1("show");
        });
    }

    let window_clone = window.clone();
    set_timeout(window, duration_ms as i32, move || {
        let _ = message.class_list().remove_1("show");
        set_timeout(&window_clone, TOAST_FADE_MS, move || {
            message.remove();
        });
    });
}

fn set_timeout<F: FnOnce() + 'static>(window: &Window, ms: i32, f: F) {
    let closure = Closure::once(f);
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        ms,
    );
    closure.forget();
}
