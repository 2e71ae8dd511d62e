//! Content script entry point
//!
//! Loads the stored list, highlights it, then wires pointer, keyboard, focus
//! and runtime-message events into a shared [`WordMemory`].

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Document, KeyboardEvent, MouseEvent, Window};

use super::chrome::{self, ChromeStorage};
use super::dom::{self, DomPage, DomProbe};
use crate::consts::SETTINGS_KEY;
use crate::controller::{Change, PointerPosition, WordMemory};
use crate::persistence;
use crate::protocol;
use crate::settings::Settings;

type Memory = Rc<RefCell<WordMemory<DomPage, ChromeStorage>>>;

#[wasm_bindgen]
pub async fn start_content_script() {
    super::init_logging();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };

    let settings = Settings::load().await;
    let stored = persistence::load_or_empty(&ChromeStorage).await;

    let mut memory = WordMemory::new(DomPage::new(document.clone()), ChromeStorage, settings);
    memory.load(stored);
    let memory: Memory = Rc::new(RefCell::new(memory));

    setup_pointer_tracking(&document, memory.clone());
    setup_modifier_keys(&window, &document, memory.clone());
    setup_blur(&window, memory.clone());
    setup_settings_watch(memory.clone());
    setup_message_handler(&window, &document, memory);

    log::info!("Word Memory content script ready");
}

/// Show the toast for a change, if the user wants toasts
fn announce(window: &Window, document: &Document, memory: &Memory, change: &Change) {
    let settings = memory.borrow().settings().clone();
    if !settings.show_toasts {
        return;
    }
    if let Some((text, kind)) = change.toast() {
        dom::show_toast(window, document, &text, kind, settings.toast_duration_ms);
    }
}

fn setup_pointer_tracking(document: &Document, memory: Memory) {
    let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
        memory.borrow_mut().on_pointer_move(PointerPosition::new(
            event.client_x() as f64,
            event.client_y() as f64,
        ));
    });
    let _ = document.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_modifier_keys(window: &Window, document: &Document, memory: Memory) {
    // Key down: resolve and toggle the hovered word
    {
        let memory = memory.clone();
        let window = window.clone();
        let doc = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let change = memory
                .borrow_mut()
                .on_key_down(&event.key(), |pos| DomProbe::new(&window, &doc, pos));
            if let Some(change) = change {
                announce(&window, &doc, &memory, &change);
            }
        });
        let _ = document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Key up: disarm
    {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            memory.borrow_mut().on_key_up(&event.key());
        });
        let _ = document.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn setup_blur(window: &Window, memory: Memory) {
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        memory.borrow_mut().on_blur();
    });
    let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Pick up preference changes made in the popup without a reload
fn setup_settings_watch(memory: Memory) {
    chrome::watch_storage_key(SETTINGS_KEY, move |json| {
        let settings = Settings::from_json(json);
        log::info!("Settings changed, modifier is now {}", settings.modifier.as_str());
        memory.borrow_mut().set_settings(settings);
    });
}

fn setup_message_handler(window: &Window, document: &Document, memory: Memory) {
    let window = window.clone();
    let document = document.clone();
    chrome::listen_for_messages(move |json| {
        let request = protocol::parse_request(json)?;
        let (response, change) = memory.borrow_mut().handle_request(request);
        if let Some(change) = change {
            announce(&window, &document, &memory, &change);
        }
        match serde_json::to_string(&response) {
            Ok(reply) => Some(reply),
            Err(e) => {
                log::warn!("Could not encode reply: {}", e);
                None
            }
        }
    });
}
