//! Word Memory - collect vocabulary by hovering words on any webpage
//!
//! Core modules:
//! - `resolver`: Which word is under the pointer (layered fallbacks)
//! - `highlight`: Wrap/unwrap saved words in page text
//! - `controller`: Content-script state and event handling
//! - `popup`: Popup view model and storage/message synchronization
//! - `persistence`: Stored word list format and store seams
//! - `platform`: Browser bindings (wasm32 only)

pub mod controller;
pub mod error;
pub mod highlight;
pub mod page;
pub mod persistence;
pub mod popup;
pub mod protocol;
pub mod resolver;
pub mod settings;
pub mod word;

#[cfg(target_arch = "wasm32")]
pub mod platform;

pub use controller::{Change, PointerPosition, WordMemory};
pub use error::{Error, Result};
pub use page::{MemoryPage, PageTree};
pub use persistence::{MemoryStore, WordSink, WordStore};
pub use settings::{ModifierKey, Settings};
pub use word::{SavedWord, WordSet};

/// Extension-wide constants
pub mod consts {
    /// Storage slot holding the saved-word array
    pub const STORAGE_KEY: &str = "savedWords";
    /// Storage slot holding user settings
    pub const SETTINGS_KEY: &str = "wordMemorySettings";

    /// Shortest word that can be saved
    pub const MIN_WORD_LEN: usize = 3;

    /// Class on highlight wrappers
    pub const HIGHLIGHT_CLASS: &str = "word-memory-highlight";
    /// Class on toast messages
    pub const MESSAGE_CLASS: &str = "word-memory-message";

    /// Delay before a new toast gets its `show` class (lets the CSS transition run)
    pub const TOAST_SHOW_DELAY_MS: i32 = 10;
    /// Default time a toast stays visible
    pub const TOAST_DURATION_MS: u32 = 2000;
    /// Fade-out time before a toast is detached
    pub const TOAST_FADE_MS: i32 = 300;
}
