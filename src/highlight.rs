//! Highlight manager
//!
//! Highlighting is two phases: walk the page collecting eligible text nodes
//! and their match spans into a [`HighlightPlan`], then apply the plan in one
//! batch. Text already inside a highlight is never eligible, so highlighting a
//! word twice cannot double-wrap it.

use std::ops::Range;

use regex::Regex;

use crate::consts::{HIGHLIGHT_CLASS, MESSAGE_CLASS};
use crate::page::{NodeKind, PageTree, Segment};
use crate::word::SavedWord;

/// Tags whose text is never highlighted
const SKIPPED_TAGS: &[&str] = &["SCRIPT", "STYLE", "NOSCRIPT", "TEXTAREA"];

/// Classes marking the extension's own nodes
const OWN_CLASSES: &[&str] = &[HIGHLIGHT_CLASS, MESSAGE_CLASS];

/// Case-insensitive ASCII whole-word matcher for a group of saved words
#[derive(Debug, Clone)]
pub struct WordMatcher {
    regex: Regex,
}

impl WordMatcher {
    /// Build a matcher, or `None` when there are no words to match
    pub fn new<'a, I>(words: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a SavedWord>,
    {
        let alternation = words
            .into_iter()
            .map(|w| regex::escape(w.as_str()))
            .collect::<Vec<_>>()
            .join("|");
        if alternation.is_empty() {
            return None;
        }
        // `-u` keeps \b ASCII-only: accented letters count as boundaries
        let pattern = format!(r"(?i-u)\b(?:{alternation})\b");
        match Regex::new(&pattern) {
            Ok(regex) => Some(Self { regex }),
            Err(e) => {
                log::warn!("Failed to build word matcher: {}", e);
                None
            }
        }
    }

    /// Non-overlapping byte ranges of whole-word matches in `text`
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).collect()
    }
}

/// Split `text` into plain and marked runs around `spans`.
///
/// Spans must be sorted and non-overlapping, as [`WordMatcher::spans`] returns.
pub fn segment(text: &str, spans: &[Range<usize>]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(spans.len() * 2 + 1);
    let mut cursor = 0;
    for span in spans {
        if span.start > cursor {
            segments.push(Segment::Plain(text[cursor..span.start].to_string()));
        }
        segments.push(Segment::Marked(text[span.clone()].to_string()));
        cursor = span.end;
    }
    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }
    segments
}

/// One text node to rewrite
#[derive(Debug, Clone)]
pub struct PlannedRewrite<N> {
    pub node: N,
    pub segments: Vec<Segment>,
}

impl<N> PlannedRewrite<N> {
    pub fn occurrences(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Marked(_)))
            .count()
    }
}

/// All rewrites for one highlight pass, computed before touching the page
#[derive(Debug, Clone)]
pub struct HighlightPlan<N> {
    pub rewrites: Vec<PlannedRewrite<N>>,
}

impl<N> HighlightPlan<N> {
    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    pub fn occurrences(&self) -> usize {
        self.rewrites.iter().map(|r| r.occurrences()).sum()
    }
}

/// Outcome of a highlight pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightReport {
    pub nodes_rewritten: usize,
    pub occurrences: usize,
}

/// Text nodes under the body that may receive highlights, with their text
pub fn eligible_text_nodes<T: PageTree>(tree: &T) -> Vec<(T::Node, String)> {
    let mut out = Vec::new();
    let Some(body) = tree.body() else {
        return out;
    };

    // Explicit stack, children pushed in reverse to keep document order
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        match tree.kind(&node) {
            NodeKind::Text(text) => {
                if !text.is_empty() {
                    out.push((node, text));
                }
            }
            NodeKind::Element(info) => {
                if SKIPPED_TAGS.contains(&info.tag.as_str())
                    || OWN_CLASSES.iter().any(|c| info.has_class(c))
                {
                    continue;
                }
                stack.extend(tree.children(&node).into_iter().rev());
            }
            NodeKind::Other => {}
        }
    }
    out
}

/// Compute the rewrites that would highlight `words`, without applying them
pub fn plan<'a, T, I>(tree: &T, words: I) -> HighlightPlan<T::Node>
where
    T: PageTree,
    I: IntoIterator<Item = &'a SavedWord>,
{
    let Some(matcher) = WordMatcher::new(words) else {
        return HighlightPlan { rewrites: Vec::new() };
    };

    let rewrites = eligible_text_nodes(tree)
        .into_iter()
        .filter_map(|(node, text)| {
            let spans = matcher.spans(&text);
            (!spans.is_empty()).then(|| PlannedRewrite {
                segments: segment(&text, &spans),
                node,
            })
        })
        .collect();
    HighlightPlan { rewrites }
}

/// Apply a plan in one batch.
///
/// A rewrite that fails (the node vanished, the DOM threw) is logged and
/// skipped; the rest still apply.
pub fn apply<T: PageTree>(tree: &mut T, plan: HighlightPlan<T::Node>) -> HighlightReport {
    let mut report = HighlightReport::default();
    for rewrite in plan.rewrites {
        match tree.splice_text(&rewrite.node, &rewrite.segments, HIGHLIGHT_CLASS) {
            Ok(()) => {
                report.nodes_rewritten += 1;
                report.occurrences += rewrite.occurrences();
            }
            Err(e) => log::debug!("Skipping highlight rewrite: {}", e),
        }
    }
    report
}

/// Wrap every whole-word occurrence of `words` in a highlight element
pub fn highlight<'a, T, I>(tree: &mut T, words: I) -> HighlightReport
where
    T: PageTree,
    I: IntoIterator<Item = &'a SavedWord>,
{
    let plan = plan(tree, words);
    if plan.is_empty() {
        return HighlightReport::default();
    }
    let planned = plan.occurrences();
    let report = apply(tree, plan);
    if report.occurrences < planned {
        log::warn!(
            "{} of {} planned highlights could not be applied",
            planned - report.occurrences,
            planned
        );
    }
    log::debug!(
        "Highlighted {} occurrences in {} text nodes",
        report.occurrences,
        report.nodes_rewritten
    );
    report
}

/// All highlight elements currently in the page, in document order
pub fn highlight_elements<T: PageTree>(tree: &T) -> Vec<T::Node> {
    let mut out = Vec::new();
    let Some(body) = tree.body() else {
        return out;
    };
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if let NodeKind::Element(info) = tree.kind(&node) {
            if info.has_class(HIGHLIGHT_CLASS) {
                out.push(node);
                continue;
            }
            stack.extend(tree.children(&node).into_iter().rev());
        }
    }
    out
}

/// Unwrap highlights of `word`; returns how many were removed
pub fn remove_highlight<T: PageTree>(tree: &mut T, word: &SavedWord) -> usize {
    unwrap_where(tree, |text| text.eq_ignore_ascii_case(word.as_str()))
}

/// Unwrap every highlight; returns how many were removed
pub fn clear_highlights<T: PageTree>(tree: &mut T) -> usize {
    unwrap_where(tree, |_| true)
}

fn unwrap_where<T, F>(tree: &mut T, mut matches: F) -> usize
where
    T: PageTree,
    F: FnMut(&str) -> bool,
{
    let mut removed = 0;
    for marker in highlight_elements(tree) {
        if !matches(&tree.text_content(&marker)) {
            continue;
        }
        let parent = tree.parent(&marker);
        let result = tree.unwrap_element(&marker).and_then(|()| match &parent {
            Some(parent) => tree.normalize(parent),
            None => Ok(()),
        });
        match result {
            Ok(()) => removed += 1,
            Err(e) => log::debug!("Skipping highlight removal: {}", e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MemoryPage;
    use proptest::prelude::*;

    fn word(s: &str) -> SavedWord {
        SavedWord::parse(s).unwrap()
    }

    fn marked(s: &str) -> String {
        format!("<span class=\"{HIGHLIGHT_CLASS}\">{s}</span>")
    }

    #[test]
    fn test_matcher_whole_words_case_insensitive() {
        let w = word("cat");
        let matcher = WordMatcher::new([&w]).unwrap();
        let text = "Cat, cat! CAT concat cats cat_ cat.";
        let found: Vec<&str> = matcher.spans(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(found, vec!["Cat", "cat", "CAT", "cat"]);
    }

    #[test]
    fn test_matcher_ascii_boundaries() {
        let w = word("cafe");
        let matcher = WordMatcher::new([&w]).unwrap();
        // é is not an ASCII word character, so it forms a boundary
        assert_eq!(matcher.spans("caféine cafe2 écafe").len(), 1);
    }

    #[test]
    fn test_matcher_prefers_longer_alternative() {
        let (a, b) = (word("cat"), word("cats"));
        let matcher = WordMatcher::new([&a, &b]).unwrap();
        let text = "cats and cat";
        let found: Vec<&str> = matcher.spans(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(found, vec!["cats", "cat"]);
    }

    #[test]
    fn test_matcher_empty() {
        assert!(WordMatcher::new(std::iter::empty()).is_none());
    }

    #[test]
    fn test_segment() {
        let text = "a cat sat";
        assert_eq!(
            segment(text, &[2..5]),
            vec![
                Segment::Plain("a ".into()),
                Segment::Marked("cat".into()),
                Segment::Plain(" sat".into()),
            ]
        );
        assert_eq!(segment("cat", &[0..3]), vec![Segment::Marked("cat".into())]);
    }

    #[test]
    fn test_highlight_wraps_each_occurrence_once() {
        let mut page = MemoryPage::from_paragraphs("The Elephant met an elephant.\nNo match here");
        let w = word("elephant");

        let report = highlight(&mut page, [&w]);
        assert_eq!(report, HighlightReport { nodes_rewritten: 1, occurrences: 2 });
        assert_eq!(
            page.body_markup(),
            format!(
                "<p>The {} met an {}.</p><p>No match here</p>",
                marked("Elephant"),
                marked("elephant")
            )
        );
    }

    #[test]
    fn test_highlight_twice_does_not_double_wrap() {
        let mut page = MemoryPage::from_paragraphs("owl and owl");
        let w = word("owl");
        highlight(&mut page, [&w]);
        let once = page.body_markup();

        let again = highlight(&mut page, [&w]);
        assert_eq!(again.occurrences, 0);
        assert_eq!(page.body_markup(), once);
    }

    #[test]
    fn test_highlight_skips_scripts_styles_and_own_ui() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let script = page.append_element(body, "script", &[]);
        page.append_text(script, "var tiger = 1;");
        let style = page.append_element(body, "style", &[]);
        page.append_text(style, ".tiger {}");
        let toast = page.append_element(body, "div", &[MESSAGE_CLASS, "success"]);
        page.append_text(toast, "\"tiger\" added to your word list!");
        let p = page.append_element(body, "p", &[]);
        page.append_text(p, "a tiger");

        let w = word("tiger");
        let report = highlight(&mut page, [&w]);
        assert_eq!(report.occurrences, 1);
        assert_eq!(page.markup(p), format!("<p>a {}</p>", marked("tiger")));
    }

    #[test]
    fn test_highlight_descends_into_inline_elements() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let p = page.append_element(body, "p", &[]);
        page.append_text(p, "a ");
        let b = page.append_element(p, "b", &[]);
        page.append_text(b, "Cat");
        page.append_text(p, " and cat");
        let before = page.body_markup();

        let w = word("cat");
        let planned = plan(&page, [&w]);
        assert_eq!(planned.rewrites.len(), 2);
        assert_eq!(planned.occurrences(), 2);

        let report = highlight(&mut page, [&w]);
        assert_eq!(report, HighlightReport { nodes_rewritten: 2, occurrences: 2 });
        assert_eq!(
            page.markup(p),
            format!("<p>a <b>{}</b> and {}</p>", marked("Cat"), marked("cat"))
        );

        assert_eq!(clear_highlights(&mut page), 2);
        assert_eq!(page.body_markup(), before);
    }

    #[test]
    fn test_highlight_skips_noscript_and_textarea() {
        let mut page = MemoryPage::new();
        let body = page.body_id();
        let noscript = page.append_element(body, "noscript", &[]);
        let inner = page.append_element(noscript, "div", &[]);
        page.append_text(inner, "cat");
        let textarea = page.append_element(body, "textarea", &[]);
        page.append_text(textarea, "my cat");
        let p = page.append_element(body, "p", &[]);
        page.append_text(p, "one cat");
        let before = page.body_markup();

        let w = word("cat");
        let report = highlight(&mut page, [&w]);
        assert_eq!(report.occurrences, 1);
        assert_eq!(page.markup(noscript), "<noscript><div>cat</div></noscript>");
        assert_eq!(page.markup(textarea), "<textarea>my cat</textarea>");

        clear_highlights(&mut page);
        assert_eq!(page.body_markup(), before);
    }

    #[test]
    fn test_highlight_does_not_nest_other_words() {
        let mut page = MemoryPage::from_paragraphs("red fox");
        let (fox, red) = (word("fox"), word("red"));
        highlight(&mut page, [&fox]);
        highlight(&mut page, [&red]);
        assert_eq!(
            page.body_markup(),
            format!("<p>{} {}</p>", marked("red"), marked("fox"))
        );
        assert_eq!(highlight_elements(&page).len(), 2);
    }

    #[test]
    fn test_remove_highlight_restores_text() {
        let original = "Bees, bees everywhere; beeswax too.";
        let mut page = MemoryPage::from_paragraphs(original);
        let w = word("bees");
        highlight(&mut page, [&w]);
        assert_eq!(highlight_elements(&page).len(), 2);

        let removed = remove_highlight(&mut page, &w);
        assert_eq!(removed, 2);
        assert_eq!(page.body_markup(), format!("<p>{original}</p>"));
        // Normalized back into a single text node
        let p = page.children(&page.body_id())[0];
        assert_eq!(page.children(&p).len(), 1);
    }

    #[test]
    fn test_remove_highlight_leaves_other_words() {
        let mut page = MemoryPage::from_paragraphs("sun and moon");
        let (sun, moon) = (word("sun"), word("moon"));
        highlight(&mut page, [&sun, &moon]);
        remove_highlight(&mut page, &sun);
        assert_eq!(page.body_markup(), format!("<p>sun and {}</p>", marked("moon")));
    }

    #[test]
    fn test_clear_highlights() {
        let original = "alpha beta gamma";
        let mut page = MemoryPage::from_paragraphs(original);
        let words = [word("alpha"), word("gamma")];
        highlight(&mut page, words.iter());
        assert_eq!(clear_highlights(&mut page), 2);
        assert!(highlight_elements(&page).is_empty());
        assert_eq!(page.body_markup(), format!("<p>{original}</p>"));
    }

    proptest! {
        #[test]
        fn prop_highlight_then_clear_restores_text(
            text in "[a-zA-Z ,.!_0-9]{0,80}",
            target in "[a-z]{3,6}",
        ) {
            let mut page = MemoryPage::from_paragraphs(&text);
            let before_text = page.text_content(&page.body_id());
            let before_markup = page.body_markup();
            let w = SavedWord::parse(&target).unwrap();

            let report = highlight(&mut page, [&w]);
            prop_assert_eq!(page.text_content(&page.body_id()), before_text.clone());

            // Every wrapped element holds exactly one case-insensitive match
            let markers = highlight_elements(&page);
            prop_assert_eq!(markers.len(), report.occurrences);
            for m in &markers {
                prop_assert!(page.text_content(m).eq_ignore_ascii_case(&target));
            }

            // And no unwrapped occurrence is left behind
            let matcher = WordMatcher::new([&w]).unwrap();
            for (_, remaining) in eligible_text_nodes(&page) {
                prop_assert!(matcher.spans(&remaining).is_empty());
            }

            clear_highlights(&mut page);
            prop_assert_eq!(page.text_content(&page.body_id()), before_text);
            prop_assert_eq!(page.body_markup(), before_markup);
        }
    }
}
