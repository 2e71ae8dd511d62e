//! Popup <-> page messages
//!
//! Requests are tagged by `action`:
//!
//! - `{"action": "getWords"}` -> `{"words": [...]}`
//! - `{"action": "removeWord", "word": "..."}` -> `{"success": true}`
//! - `{"action": "clearAllWords"}` -> `{"success": true}`

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetWords,
    RemoveWord { word: String },
    ClearAllWords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Words { words: Vec<String> },
    Ack { success: bool },
}

impl Response {
    pub fn ack() -> Self {
        Response::Ack { success: true }
    }

    /// The word list, if this reply carries one
    pub fn into_words(self) -> Option<Vec<String>> {
        match self {
            Response::Words { words } => Some(words),
            Response::Ack { .. } => None,
        }
    }
}

/// Parse an inbound message; unknown actions yield `None` and get no reply
pub fn parse_request(json: &str) -> Option<Request> {
    match serde_json::from_str(json) {
        Ok(request) => Some(request),
        Err(e) => {
            log::debug!("Ignoring message: {}", e);
            None
        }
    }
}

/// Channel from the popup to the content script in the active tab
pub trait PageChannel {
    /// Send a request and wait for the reply.
    ///
    /// Fails when no content script is listening.
    fn send(&self, request: &Request) -> impl Future<Output = Result<Response>>;
}
