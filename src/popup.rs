//! Popup view model and list synchronization
//!
//! The popup prefers asking the page: the content script's in-memory set is
//! authoritative while the page is loaded. When no content script answers
//! (chrome:// pages, tabs opened before install) it reads and writes storage
//! directly instead.

use crate::persistence::{self, WordStore};
use crate::protocol::{PageChannel, Request};

/// Text shown when the list is empty
pub const EMPTY_TITLE: &str = "No words saved yet";

/// Confirmation prompt before clearing the list
pub const CLEAR_CONFIRMATION: &str =
    "Are you sure you want to remove all words from your list? This action cannot be undone.";

/// What the popup renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub count: usize,
    /// Alphabetical
    pub rows: Vec<String>,
}

impl PopupView {
    pub fn from_words(mut words: Vec<String>) -> Self {
        words.sort();
        words.dedup();
        Self {
            count: words.len(),
            rows: words,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Where the popup's list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Page,
    Storage,
}

/// Popup-side access to the word list
pub struct PopupSync<C, S> {
    channel: C,
    store: S,
}

impl<C: PageChannel, S: WordStore> PopupSync<C, S> {
    pub fn new(channel: C, store: S) -> Self {
        Self { channel, store }
    }

    /// Current word list: from the page if it answers, else from storage
    pub async fn load(&self) -> (PopupView, Source) {
        match self.channel.send(&Request::GetWords).await {
            Ok(response) => {
                if let Some(words) = response.into_words() {
                    return (PopupView::from_words(words), Source::Page);
                }
                log::debug!("Page reply had no word list, reading storage");
            }
            Err(e) => log::debug!("{}; reading storage", e),
        }
        let words = persistence::load_or_empty(&self.store).await;
        (PopupView::from_words(words), Source::Storage)
    }

    /// Remove one word, then return the refreshed list
    pub async fn remove(&self, word: &str) -> (PopupView, Source) {
        let request = Request::RemoveWord {
            word: word.to_string(),
        };
        if let Err(e) = self.channel.send(&request).await {
            log::debug!("{}; removing {:?} from storage", e, word);
            if let Err(e) = persistence::remove_stored(&self.store, word).await {
                log::warn!("Could not remove {:?}: {}", word, e);
            }
        }
        self.load().await
    }

    /// Remove every word, then return the refreshed list.
    ///
    /// The caller is responsible for confirming with the user first.
    pub async fn clear(&self) -> (PopupView, Source) {
        if let Err(e) = self.channel.send(&Request::ClearAllWords).await {
            log::debug!("{}; clearing storage", e);
            if let Err(e) = self.store.save(Vec::new()).await {
                log::warn!("Could not clear word list: {}", e);
            }
        }
        self.load().await
    }
}
