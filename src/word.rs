//! Saved words and the in-memory word set
//!
//! A saved word is a lowercase ASCII-alphabetic token of at least
//! [`MIN_WORD_LEN`] letters. Anything else is rejected at construction so the
//! set can never hold an invalid entry.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_WORD_LEN;

/// A validated, lowercased vocabulary word
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SavedWord(String);

impl SavedWord {
    /// Validate a candidate string and lowercase it.
    ///
    /// Returns `None` unless the candidate is purely ASCII-alphabetic and
    /// longer than two characters.
    pub fn parse(candidate: &str) -> Option<Self> {
        if is_valid_candidate(candidate) {
            Some(Self(candidate.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SavedWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SavedWord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SavedWord::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("not a saveable word: {raw:?}")))
    }
}

/// True if `candidate` may become a saved word
#[inline]
pub fn is_valid_candidate(candidate: &str) -> bool {
    candidate.len() >= MIN_WORD_LEN && candidate.bytes().all(|b| b.is_ascii_alphabetic())
}

/// The user's vocabulary list
///
/// Backed by an ordered set, so snapshots come out alphabetical. Callers
/// should not rely on that beyond display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordSet {
    words: BTreeSet<SavedWord>,
}

impl WordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from the stored array form.
    ///
    /// Entries that fail validation are dropped; case variants collapse.
    pub fn from_stored<I, S>(stored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut dropped = 0usize;
        for raw in stored {
            match SavedWord::parse(raw.as_ref()) {
                Some(word) => {
                    set.words.insert(word);
                }
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            log::warn!("Ignored {} invalid stored entries", dropped);
        }
        set
    }

    pub fn contains(&self, word: &SavedWord) -> bool {
        self.words.contains(word)
    }

    /// Insert a word, returning false if it was already present
    pub fn insert(&mut self, word: SavedWord) -> bool {
        self.words.insert(word)
    }

    /// Remove a word, returning false if it was absent
    pub fn remove(&mut self, word: &SavedWord) -> bool {
        self.words.remove(word)
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SavedWord> {
        self.words.iter()
    }

    /// Array form written to storage and sent to the popup
    pub fn to_stored(&self) -> Vec<String> {
        self.words.iter().map(|w| w.as_str().to_owned()).collect()
    }
}

impl<'a> IntoIterator for &'a WordSet {
    type Item = &'a SavedWord;
    type IntoIter = std::collections::btree_set::Iter<'a, SavedWord>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        let word = SavedWord::parse("Elephant").unwrap();
        assert_eq!(word.as_str(), "elephant");
    }

    #[test]
    fn test_parse_rejects_short() {
        assert!(SavedWord::parse("").is_none());
        assert!(SavedWord::parse("a").is_none());
        assert!(SavedWord::parse("an").is_none());
        assert!(SavedWord::parse("ant").is_some());
    }

    #[test]
    fn test_parse_rejects_non_alphabetic() {
        assert!(SavedWord::parse("abc1").is_none());
        assert!(SavedWord::parse("don't").is_none());
        assert!(SavedWord::parse("well-known").is_none());
        assert!(SavedWord::parse("café").is_none());
        assert!(SavedWord::parse(" cat").is_none());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: SavedWord = serde_json::from_str("\"Tiger\"").unwrap();
        assert_eq!(ok.as_str(), "tiger");
        assert!(serde_json::from_str::<SavedWord>("\"no\"").is_err());
    }

    #[test]
    fn test_from_stored_filters_and_dedups() {
        let set = WordSet::from_stored(["zebra", "Zebra", "ox", "apple", "r2d2"]);
        assert_eq!(set.to_stored(), vec!["apple", "zebra"]);
    }

    #[test]
    fn test_add_remove_add_idempotent() {
        let word = SavedWord::parse("river").unwrap();
        let mut set = WordSet::from_stored(["stone"]);
        set.insert(word.clone());
        let after_first_add = set.clone();

        set.remove(&word);
        set.insert(word);
        assert_eq!(set, after_first_add);
    }
}
