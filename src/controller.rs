//! Content-script controller
//!
//! [`WordMemory`] owns all runtime state of the in-page side: the word set,
//! whether the modifier is held, the last pointer position, and the page it
//! highlights. Event handlers on wasm32 hold it in `Rc<RefCell<_>>` and call
//! into it; everything here is synchronous.

use crate::highlight::{self, HighlightReport};
use crate::page::PageTree;
use crate::persistence::WordSink;
use crate::protocol::{Request, Response};
use crate::resolver::{self, HoverProbe};
use crate::settings::Settings;
use crate::word::{SavedWord, WordSet};

/// Pointer position in viewport (client) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Toast styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
}

impl ToastKind {
    pub fn as_class(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Info => "info",
        }
    }
}

/// A mutation of the word list, already persisted and reflected on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(SavedWord),
    Removed(SavedWord),
    Cleared { count: usize },
}

impl Change {
    /// Toast to show for this change, if any
    pub fn toast(&self) -> Option<(String, ToastKind)> {
        match self {
            Change::Added(word) => Some((
                format!("\"{word}\" added to your word list!"),
                ToastKind::Success,
            )),
            Change::Removed(word) => Some((
                format!("\"{word}\" removed from your word list!"),
                ToastKind::Info,
            )),
            Change::Cleared { .. } => None,
        }
    }
}

pub struct WordMemory<T: PageTree, S: WordSink> {
    words: WordSet,
    modifier_down: bool,
    last_pointer: Option<PointerPosition>,
    settings: Settings,
    tree: T,
    sink: S,
}

impl<T: PageTree, S: WordSink> WordMemory<T, S> {
    /// Create a controller with an empty word list; call [`Self::load`] next
    pub fn new(tree: T, sink: S, settings: Settings) -> Self {
        Self {
            words: WordSet::new(),
            modifier_down: false,
            last_pointer: None,
            settings,
            tree,
            sink,
        }
    }

    /// Adopt the stored word list and highlight all of it in one pass
    pub fn load<I, W>(&mut self, stored: I) -> HighlightReport
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        self.words = WordSet::from_stored(stored);
        let report = highlight::highlight(&mut self.tree, self.words.iter());
        log::info!(
            "Loaded {} saved words, {} occurrences highlighted",
            self.words.len(),
            report.occurrences
        );
        report
    }

    pub fn words(&self) -> &WordSet {
        &self.words
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swap in new preferences, disarming if the modifier key changed
    pub fn set_settings(&mut self, settings: Settings) {
        if settings.modifier != self.settings.modifier {
            self.modifier_down = false;
        }
        self.settings = settings;
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn modifier_down(&self) -> bool {
        self.modifier_down
    }

    pub fn on_pointer_move(&mut self, pos: PointerPosition) {
        self.last_pointer = Some(pos);
    }

    /// Handle a key press.
    ///
    /// On the first press of the modifier, resolves the word under the last
    /// known pointer position and toggles it. Auto-repeat while the key is
    /// held does nothing.
    pub fn on_key_down<P, F>(&mut self, key: &str, make_probe: F) -> Option<Change>
    where
        P: HoverProbe,
        F: FnOnce(PointerPosition) -> P,
    {
        if !self.settings.modifier.matches(key) || self.modifier_down {
            return None;
        }
        self.modifier_down = true;

        let pos = self.last_pointer?;
        let mut probe = make_probe(pos);
        let resolution = resolver::resolve(&mut probe)?;
        Some(self.toggle(resolution.word))
    }

    pub fn on_key_up(&mut self, key: &str) {
        if self.settings.modifier.matches(key) {
            self.modifier_down = false;
        }
    }

    /// Focus left the page; a key-up may never arrive
    pub fn on_blur(&mut self) {
        self.modifier_down = false;
    }

    pub fn toggle(&mut self, word: SavedWord) -> Change {
        if self.words.contains(&word) {
            self.remove(word)
        } else {
            self.add(word)
        }
    }

    pub fn add(&mut self, word: SavedWord) -> Change {
        if !self.words.insert(word.clone()) {
            log::debug!("{:?} already saved", word.as_str());
        }
        self.persist();
        highlight::highlight(&mut self.tree, [&word]);
        log::info!("Added {:?} ({} words)", word.as_str(), self.words.len());
        Change::Added(word)
    }

    pub fn remove(&mut self, word: SavedWord) -> Change {
        self.words.remove(&word);
        self.persist();
        let unwrapped = highlight::remove_highlight(&mut self.tree, &word);
        log::info!(
            "Removed {:?} ({} highlights cleared, {} words left)",
            word.as_str(),
            unwrapped,
            self.words.len()
        );
        Change::Removed(word)
    }

    pub fn clear(&mut self) -> Change {
        let count = self.words.len();
        self.words.clear();
        self.persist();
        let unwrapped = highlight::clear_highlights(&mut self.tree);
        log::info!("Cleared {} words, {} highlights", count, unwrapped);
        Change::Cleared { count }
    }

    /// Serve a request from the popup
    pub fn handle_request(&mut self, request: Request) -> (Response, Option<Change>) {
        match request {
            Request::GetWords => (
                Response::Words {
                    words: self.words.to_stored(),
                },
                None,
            ),
            Request::RemoveWord { word } => {
                // An invalid word can't be in the set; nothing to undo
                let change = SavedWord::parse(&word).map(|w| self.remove(w));
                (Response::ack(), change)
            }
            Request::ClearAllWords => (Response::ack(), Some(self.clear())),
        }
    }

    fn persist(&self) {
        self.sink.write(self.words.to_stored());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::HIGHLIGHT_CLASS;
    use crate::page::MemoryPage;
    use crate::persistence::MemoryStore;
    use crate::resolver::CaretText;
    use crate::settings::ModifierKey;

    /// Probe that answers with a fixed caret text
    struct CaretProbe(&'static str, usize);

    impl HoverProbe for CaretProbe {
        fn target_excluded(&self) -> bool {
            false
        }

        fn caret_text(&self) -> Option<CaretText> {
            Some(CaretText {
                text: self.0.to_string(),
                offset: self.1,
            })
        }

        fn element_text(&self) -> Option<String> {
            None
        }

        fn selection_word(&mut self) -> Option<String> {
            None
        }
    }

    fn controller(text: &str) -> (WordMemory<MemoryPage, MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let memory = WordMemory::new(
            MemoryPage::from_paragraphs(text),
            store.clone(),
            Settings::default(),
        );
        (memory, store)
    }

    fn word(s: &str) -> SavedWord {
        SavedWord::parse(s).unwrap()
    }

    #[test]
    fn test_load_highlights_stored_words() {
        let (mut memory, store) = controller("A heron and a crane.");
        let report = memory.load(["heron", "Crane", "x1"]);
        assert_eq!(report.occurrences, 2);
        assert_eq!(memory.words().to_stored(), vec!["crane", "heron"]);
        // Loading does not rewrite storage
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_modifier_hover_adds_word() {
        let (mut memory, store) = controller("the elephant sat");
        memory.load(Vec::<String>::new());
        memory.on_pointer_move(PointerPosition::new(10.0, 10.0));

        let change = memory.on_key_down("Control", |_| CaretProbe("the elephant sat", 6));
        assert_eq!(change, Some(Change::Added(word("elephant"))));
        assert_eq!(store.snapshot(), vec!["elephant"]);
        assert_eq!(
            memory.tree().body_markup(),
            format!("<p>the <span class=\"{HIGHLIGHT_CLASS}\">elephant</span> sat</p>")
        );
        let (toast, kind) = change.unwrap().toast().unwrap();
        assert_eq!(toast, "\"elephant\" added to your word list!");
        assert_eq!(kind, ToastKind::Success);
    }

    #[test]
    fn test_key_repeat_does_not_toggle_back() {
        let (mut memory, store) = controller("the elephant sat");
        memory.on_pointer_move(PointerPosition::default());
        assert!(memory.on_key_down("Control", |_| CaretProbe("elephant", 2)).is_some());
        assert!(memory.on_key_down("Control", |_| CaretProbe("elephant", 2)).is_none());
        assert_eq!(store.snapshot(), vec!["elephant"]);

        memory.on_key_up("Control");
        let change = memory.on_key_down("Control", |_| CaretProbe("elephant", 2));
        assert_eq!(change, Some(Change::Removed(word("elephant"))));
        assert!(store.snapshot().is_empty());
        assert_eq!(memory.tree().body_markup(), "<p>the elephant sat</p>");
    }

    #[test]
    fn test_other_keys_and_missing_pointer() {
        let (mut memory, _) = controller("word");
        assert!(memory.on_key_down("Shift", |_| CaretProbe("word", 1)).is_none());
        assert!(!memory.modifier_down());

        // No pointer seen yet: flag is armed but nothing resolves
        assert!(memory.on_key_down("Control", |_| CaretProbe("word", 1)).is_none());
        assert!(memory.modifier_down());
        memory.on_blur();
        assert!(!memory.modifier_down());
    }

    #[test]
    fn test_configured_modifier() {
        let (mut memory, _) = controller("mango");
        memory.set_settings(Settings {
            modifier: ModifierKey::Alt,
            ..Settings::default()
        });
        memory.on_pointer_move(PointerPosition::default());
        assert!(memory.on_key_down("Control", |_| CaretProbe("mango", 0)).is_none());
        assert!(memory.on_key_down("Alt", |_| CaretProbe("mango", 0)).is_some());
    }

    #[test]
    fn test_modifier_change_disarms() {
        let (mut memory, _) = controller("mango");
        memory.on_pointer_move(PointerPosition::default());
        memory.on_key_down("Control", |_| CaretProbe("mango", 0));
        assert!(memory.modifier_down());

        // Same modifier, different toast preference: still armed
        memory.set_settings(Settings {
            show_toasts: false,
            ..Settings::default()
        });
        assert!(memory.modifier_down());

        memory.set_settings(Settings {
            modifier: ModifierKey::Shift,
            ..Settings::default()
        });
        assert!(!memory.modifier_down());
        // Control is no longer the key, so releasing it is ignored
        memory.on_key_up("Control");
        assert!(memory.on_key_down("Shift", |_| CaretProbe("mango", 0)).is_some());
    }

    #[test]
    fn test_short_word_is_never_added() {
        let (mut memory, store) = controller("go on");
        memory.on_pointer_move(PointerPosition::default());
        assert!(memory.on_key_down("Control", |_| CaretProbe("go on", 1)).is_none());
        assert!(memory.words().is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_add_remove_add_is_idempotent() {
        let (mut memory, store) = controller("Owls hunt. An owl sleeps.");
        memory.load(["bat"]);

        memory.add(word("owl"));
        let stored_after_first = store.snapshot();
        let markup_after_first = memory.tree().body_markup();

        memory.remove(word("owl"));
        memory.add(word("owl"));
        assert_eq!(store.snapshot(), stored_after_first);
        assert_eq!(memory.tree().body_markup(), markup_after_first);
    }

    #[test]
    fn test_readding_present_word_does_not_double_wrap() {
        let (mut memory, _) = controller("owl");
        memory.add(word("owl"));
        let once = memory.tree().body_markup();
        memory.add(word("owl"));
        assert_eq!(memory.tree().body_markup(), once);
    }

    #[test]
    fn test_handle_requests() {
        let (mut memory, store) = controller("lion and tiger");
        memory.load(["lion", "tiger"]);

        let (response, change) = memory.handle_request(Request::GetWords);
        assert_eq!(response.into_words(), Some(vec!["lion".into(), "tiger".into()]));
        assert!(change.is_none());

        let (response, change) = memory.handle_request(Request::RemoveWord {
            word: "lion".into(),
        });
        assert_eq!(response, Response::ack());
        assert_eq!(change, Some(Change::Removed(word("lion"))));
        assert_eq!(store.snapshot(), vec!["tiger"]);

        let (response, change) = memory.handle_request(Request::RemoveWord { word: "x".into() });
        assert_eq!(response, Response::ack());
        assert!(change.is_none());
    }

    #[test]
    fn test_clear_removes_highlights_and_storage() {
        let original = "lion and tiger and bear";
        let (mut memory, store) = controller(original);
        memory.load(["lion", "tiger", "bear"]);
        assert_ne!(memory.tree().body_markup(), format!("<p>{original}</p>"));

        let (_, change) = memory.handle_request(Request::ClearAllWords);
        assert_eq!(change, Some(Change::Cleared { count: 3 }));
        assert!(change.unwrap().toast().is_none());
        assert!(memory.words().is_empty());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.writes(), 1);
        assert_eq!(memory.tree().body_markup(), format!("<p>{original}</p>"));
    }
}
