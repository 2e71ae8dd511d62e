//! Error type shared by the store, messaging and DOM layers.
//!
//! None of these surface to the user: callers log them and fall back to
//! "no word found" or "list empty".

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Extension storage rejected a read or write
    #[error("storage operation failed: {message}")]
    Storage { message: String },

    /// No content script answered, or the runtime reported `lastError`
    #[error("message delivery failed: {message}")]
    Messaging { message: String },

    /// A DOM call threw while rewriting the page
    #[error("DOM operation failed: {message}")]
    Dom { message: String },

    /// A stored value or message did not have the expected shape
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn messaging(message: impl Into<String>) -> Self {
        Self::Messaging {
            message: message.into(),
        }
    }

    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
        }
    }
}
