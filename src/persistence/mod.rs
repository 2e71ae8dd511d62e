//! Word list persistence
//!
//! Storage holds one slot, [`STORAGE_KEY`], whose value is the array form of
//! the word set. The content script reads it once at startup and rewrites it
//! whole on every change; the popup reads and writes it directly only when no
//! content script answers.
//!
//! Two seams:
//! - [`WordStore`]: async load/save, awaited by startup and the popup
//! - [`WordSink`]: fire-and-forget write, used from synchronous event handlers

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub use crate::consts::STORAGE_KEY;
use crate::error::{Error, Result};

/// Shape of the storage record, `{ "savedWords": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredWords {
    #[serde(rename = "savedWords", default)]
    pub saved_words: Vec<String>,
}

impl StoredWords {
    pub fn new(saved_words: Vec<String>) -> Self {
        Self { saved_words }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Async access to the persisted word list
pub trait WordStore {
    /// Read the stored list; a missing slot reads as empty
    fn load(&self) -> impl Future<Output = Result<Vec<String>>>;

    /// Overwrite the stored list
    fn save(&self, words: Vec<String>) -> impl Future<Output = Result<()>>;
}

/// Write-behind sink for the word list
///
/// Completion is not reported back; failures are logged by the sink.
pub trait WordSink {
    fn write(&self, words: Vec<String>);
}

/// Drop `word` from the stored list, for when no content script is loaded
pub async fn remove_stored<S: WordStore>(store: &S, word: &str) -> Result<()> {
    let words = store.load().await?;
    let updated: Vec<String> = words.into_iter().filter(|w| w != word).collect();
    store.save(updated).await
}

/// Load, logging and swallowing failures as an empty list
pub async fn load_or_empty<S: WordStore>(store: &S) -> Vec<String> {
    match store.load().await {
        Ok(words) => words,
        Err(e) => {
            log::warn!("Could not read word list: {}", e);
            Vec::new()
        }
    }
}

/// Storage kept in memory, shared between clones
///
/// Used natively and in tests. Can be switched to fail every call, to stand
/// in for an unavailable storage area.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    json: Option<String>,
    failing: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        let stored = StoredWords::new(words.into_iter().map(Into::into).collect());
        store.inner.borrow_mut().json = stored.to_json().ok();
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.borrow_mut().failing = failing;
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    /// Current stored list, bypassing the failure switch
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .borrow()
            .json
            .as_deref()
            .and_then(|json| StoredWords::from_json(json).ok())
            .map(|s| s.saved_words)
            .unwrap_or_default()
    }

    fn read(&self) -> Result<Vec<String>> {
        let inner = self.inner.borrow();
        if inner.failing {
            return Err(Error::storage("memory store is failing"));
        }
        match inner.json.as_deref() {
            Some(json) => Ok(StoredWords::from_json(json)?.saved_words),
            None => Ok(Vec::new()),
        }
    }

    fn overwrite(&self, words: Vec<String>) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing {
            return Err(Error::storage("memory store is failing"));
        }
        inner.json = Some(StoredWords::new(words).to_json()?);
        inner.writes += 1;
        Ok(())
    }
}

impl WordStore for MemoryStore {
    async fn load(&self) -> Result<Vec<String>> {
        self.read()
    }

    async fn save(&self, words: Vec<String>) -> Result<()> {
        self.overwrite(words)
    }
}

impl WordSink for MemoryStore {
    fn write(&self, words: Vec<String>) {
        if let Err(e) = self.overwrite(words) {
            log::warn!("Could not persist word list: {}", e);
        }
    }
}
