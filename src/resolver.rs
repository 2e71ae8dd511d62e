//! Word boundary resolution under the pointer
//!
//! The browser gives several imperfect ways to find what is under the cursor.
//! They are tried in order, first hit wins:
//!
//! 1. Caret offset: expand over ASCII letters around the caret in its text node
//! 2. Element text: first plausible word in the hovered element's text
//! 3. Selection expand: let the browser expand a collapsed range to a word
//!
//! The DOM side is hidden behind [`HoverProbe`] so the fallback ordering and
//! the boundary scanning can run without a browser.

use crate::word::SavedWord;

/// Text node content at the caret, with the caret's byte offset into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretText {
    pub text: String,
    pub offset: usize,
}

/// Which resolution strategy produced the word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CaretOffset,
    ElementText,
    SelectionExpand,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CaretOffset => "caret offset",
            Strategy::ElementText => "element text",
            Strategy::SelectionExpand => "selection expand",
        }
    }
}

/// A word found under the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub word: SavedWord,
    pub strategy: Strategy,
}

/// What the resolver needs to ask the page about a pointer position
pub trait HoverProbe {
    /// True when the hover target must be ignored (scripts, styles, our own UI)
    fn target_excluded(&self) -> bool;

    /// Text node and offset at the caret under the pointer, if it is a text node
    fn caret_text(&self) -> Option<CaretText>;

    /// Text content of the hovered element
    fn element_text(&self) -> Option<String>;

    /// Let the browser expand a range at the pointer to word granularity.
    ///
    /// Implementations must leave the user's selection exactly as they found
    /// it, and swallow any range exception as `None`.
    fn selection_word(&mut self) -> Option<String>;
}

/// Resolve the word under the pointer, trying each strategy in order
pub fn resolve<P: HoverProbe + ?Sized>(probe: &mut P) -> Option<Resolution> {
    if probe.target_excluded() {
        return None;
    }

    let (candidate, strategy) = if let Some(word) = probe
        .caret_text()
        .and_then(|caret| expand_at_offset(&caret.text, caret.offset).map(str::to_owned))
    {
        (word, Strategy::CaretOffset)
    } else if let Some(word) = probe
        .element_text()
        .and_then(|text| first_plausible_word(&text).map(str::to_owned))
    {
        (word, Strategy::ElementText)
    } else if let Some(word) = probe
        .selection_word()
        .map(|text| text.trim().to_owned())
        .filter(|text| is_ascii_alpha(text))
    {
        (word, Strategy::SelectionExpand)
    } else {
        return None;
    };

    let word = SavedWord::parse(&candidate)?;
    log::debug!("Resolved {:?} via {}", word.as_str(), strategy.as_str());
    Some(Resolution { word, strategy })
}

/// Expand outward from `offset` over ASCII letters.
///
/// Returns the letter run touching the offset, or `None` if the offset sits
/// between two non-letters. The offset is clamped into the text.
pub fn expand_at_offset(text: &str, offset: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let offset = offset.min(bytes.len());

    let mut start = offset;
    while start > 0 && bytes[start - 1].is_ascii_alphabetic() {
        start -= 1;
    }
    let mut end = offset;
    while end < bytes.len() && bytes[end].is_ascii_alphabetic() {
        end += 1;
    }

    // ASCII letters are single bytes, so start/end are char boundaries
    (start < end).then(|| &text[start..end])
}

/// First token matching `\b[a-zA-Z]+\b` that is longer than two letters.
///
/// Tokens are maximal runs of ASCII word characters (`[A-Za-z0-9_]`); a run
/// containing a digit or underscore has no alphabetic match with a word
/// boundary on both sides, so it is skipped whole.
pub fn first_plausible_word(text: &str) -> Option<&str> {
    word_char_runs(text).find(|run| run.len() > 2 && is_ascii_alpha(run))
}

/// Convert a UTF-16 code unit offset (what the DOM reports) to a byte offset.
///
/// Offsets past the end clamp to `text.len()`; an offset landing inside a
/// surrogate pair rounds down to the start of that character.
pub fn utf16_to_byte_offset(text: &str, utf16_offset: usize) -> usize {
    let mut units = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        let next = units + ch.len_utf16();
        if next > utf16_offset {
            return byte_idx;
        }
        units = next;
    }
    text.len()
}

#[inline]
fn is_ascii_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

#[inline]
pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn word_char_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_ascii() && is_word_byte(c as u8)))
        .filter(|run| !run.is_empty())
}
