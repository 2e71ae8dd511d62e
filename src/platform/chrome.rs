//! `chrome.*` extension APIs
//!
//! Callback-style APIs are wrapped in promises on the JS side and awaited
//! here. Values cross the boundary as JSON strings and are decoded with
//! serde_json.

use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::js_message;
use crate::consts::STORAGE_KEY;
use crate::error::{Error, Result};
use crate::persistence::{StoredWords, WordSink, WordStore};
use crate::protocol::{PageChannel, Request, Response};

#[wasm_bindgen(inline_js = "
    function lastError() {
        const err = chrome.runtime.lastError;
        return err ? new Error(err.message || String(err)) : null;
    }

    export function storage_get(key) {
        return new Promise((resolve, reject) => {
            chrome.storage.sync.get([key], (record) => {
                const err = lastError();
                if (err) { reject(err); return; }
                resolve(JSON.stringify(record || {}));
            });
        });
    }

    export function storage_set(json) {
        return new Promise((resolve, reject) => {
            chrome.storage.sync.set(JSON.parse(json), () => {
                const err = lastError();
                if (err) { reject(err); return; }
                resolve();
            });
        });
    }

    export function send_to_active_tab(json) {
        return new Promise((resolve, reject) => {
            chrome.tabs.query({ active: true, currentWindow: true }, (tabs) => {
                if (!tabs || tabs.length === 0) {
                    reject(new Error('no active tab'));
                    return;
                }
                chrome.tabs.sendMessage(tabs[0].id, JSON.parse(json), (response) => {
                    const err = lastError();
                    if (err) { reject(err); return; }
                    resolve(response === undefined ? null : JSON.stringify(response));
                });
            });
        });
    }

    export function add_storage_listener(key, handler) {
        chrome.storage.onChanged.addListener((changes, area) => {
            if (area !== 'sync' || !changes[key]) return;
            const value = changes[key].newValue;
            handler(JSON.stringify(value === undefined ? {} : value));
        });
    }

    export function add_message_listener(handler) {
        chrome.runtime.onMessage.addListener((request, _sender, sendResponse) => {
            const reply = handler(JSON.stringify(request));
            if (typeof reply === 'string') {
                sendResponse(JSON.parse(reply));
            }
        });
    }
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn storage_get(key: &str) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn storage_set(json: &str) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn send_to_active_tab(json: &str) -> std::result::Result<js_sys::Promise, JsValue>;

    fn add_storage_listener(key: &str, handler: &js_sys::Function);

    fn add_message_listener(handler: &js_sys::Function);
}

/// Read the whole `{ key: value }` record for one storage key, as JSON
async fn read_record(key: &str) -> Result<String> {
    let promise = storage_get(key).map_err(|e| Error::storage(js_message(&e)))?;
    let value = JsFuture::from(promise)
        .await
        .map_err(|e| Error::storage(js_message(&e)))?;
    Ok(value.as_string().unwrap_or_else(|| "{}".to_string()))
}

async fn write_record(json: &str) -> Result<()> {
    let promise = storage_set(json).map_err(|e| Error::storage(js_message(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| Error::storage(js_message(&e)))?;
    Ok(())
}

/// JSON of the value stored under `key`, or `None` if the slot is empty
pub async fn storage_get_json(key: &str) -> Result<Option<String>> {
    let record: Map<String, Value> = serde_json::from_str(&read_record(key).await?)?;
    Ok(record.get(key).map(Value::to_string))
}

/// Store the JSON value `json` under `key`
pub async fn storage_set_json(key: &str, json: &str) -> Result<()> {
    let value: Value = serde_json::from_str(json)?;
    let mut record = Map::new();
    record.insert(key.to_string(), value);
    write_record(&Value::Object(record).to_string()).await
}

/// The saved-word slot in `chrome.storage.sync`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl WordStore for ChromeStorage {
    async fn load(&self) -> Result<Vec<String>> {
        let record = read_record(STORAGE_KEY).await?;
        Ok(StoredWords::from_json(&record)?.saved_words)
    }

    async fn save(&self, words: Vec<String>) -> Result<()> {
        let count = words.len();
        write_record(&StoredWords::new(words).to_json()?).await?;
        log::debug!("Stored {} words", count);
        Ok(())
    }
}

impl WordSink for ChromeStorage {
    fn write(&self, words: Vec<String>) {
        let store = *self;
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = store.save(words).await {
                log::warn!("Could not persist word list: {}", e);
            }
        });
    }
}

/// Messaging channel to the content script of the focused tab
#[derive(Debug, Clone, Copy, Default)]
pub struct ActiveTab;

impl PageChannel for ActiveTab {
    async fn send(&self, request: &Request) -> Result<Response> {
        let json = serde_json::to_string(request)?;
        let promise = send_to_active_tab(&json).map_err(|e| Error::messaging(js_message(&e)))?;
        let reply = JsFuture::from(promise)
            .await
            .map_err(|e| Error::messaging(js_message(&e)))?;
        let reply = reply
            .as_string()
            .ok_or_else(|| Error::messaging("empty reply"))?;
        Ok(serde_json::from_str(&reply)?)
    }
}

/// Route inbound runtime messages to `handler`.
///
/// The handler gets the request as JSON and returns the reply as JSON, or
/// `None` to leave the message unanswered.
pub fn listen_for_messages<F>(mut handler: F)
where
    F: FnMut(&str) -> Option<String> + 'static,
{
    let closure = Closure::<dyn FnMut(String) -> JsValue>::new(move |json: String| {
        match handler(&json) {
            Some(reply) => JsValue::from_str(&reply),
            None => JsValue::UNDEFINED,
        }
    });
    add_message_listener(closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Call `handler` with the new JSON value whenever `key` changes in sync
/// storage. A removed key is reported as `{}`.
pub fn watch_storage_key<F>(key: &str, mut handler: F)
where
    F: FnMut(&str) + 'static,
{
    let closure = Closure::<dyn FnMut(String)>::new(move |json: String| handler(&json));
    add_storage_listener(key, closure.as_ref().unchecked_ref());
    closure.forget();
}
