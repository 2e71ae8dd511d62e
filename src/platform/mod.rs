//! Browser platform layer (wasm32 only)
//!
//! - `chrome`: extension storage and popup <-> page messaging
//! - `dom`: live-DOM implementations of the page tree and hover probe, toasts
//! - `content`: content-script entry point and event wiring
//! - `popup`: popup entry point and rendering

pub mod chrome;
pub mod content;
pub mod dom;
pub mod popup;

use wasm_bindgen::{JsCast, JsValue};

/// Panic hook and console logger; safe to call more than once
pub(crate) fn init_logging() {
    console_error_panic_hook::set_once();
    // A second init (e.g. script injected twice) only fails to set the logger
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Best-effort message out of a thrown JS value
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
