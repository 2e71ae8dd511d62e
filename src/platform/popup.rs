//! Popup entry point
//!
//! Expects `popup.html` to provide `#wordCount`, `#wordContainer`,
//! `#refreshBtn` and `#clearAllBtn`, plus the `#modifierSelect` and
//! `#toastToggle` preference controls.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlSelectElement, MouseEvent};

use super::chrome::{ActiveTab, ChromeStorage};
use crate::popup::{CLEAR_CONFIRMATION, EMPTY_TITLE, PopupSync, PopupView};
use crate::settings::Settings;

type SharedSync = Rc<PopupSync<ActiveTab, ChromeStorage>>;

/// Popup elements and the preferences behind the empty-state hint
#[derive(Clone)]
struct PopupUi {
    document: Document,
    count: Element,
    container: Element,
    settings: Rc<RefCell<Settings>>,
}

impl PopupUi {
    fn render(&self, view: &PopupView) {
        self.count.set_text_content(Some(&view.count.to_string()));
        self.container.set_inner_html("");

        if view.is_empty() {
            if let Some(empty) = self.empty_state() {
                let _ = self.container.append_child(&empty);
            }
            return;
        }

        for word in &view.rows {
            if let Some(row) = self.row(word) {
                let _ = self.container.append_child(&row);
            }
        }
        let _ = self.container.class_list().add_1("scrollbar");
    }

    fn row(&self, word: &str) -> Option<Element> {
        let row = self.document.create_element("div").ok()?;
        row.set_class_name("word-item");

        let text = self.document.create_element("span").ok()?;
        text.set_class_name("word-text");
        text.set_text_content(Some(word));

        let button = self.document.create_element("button").ok()?;
        button.set_class_name("remove-btn");
        button.set_attribute("data-word", word).ok()?;
        button.set_text_content(Some("Remove"));

        row.append_child(&text).ok()?;
        row.append_child(&button).ok()?;
        Some(row)
    }

    fn empty_state(&self) -> Option<Element> {
        let wrapper = self.document.create_element("div").ok()?;
        wrapper.set_class_name("empty-state");

        let icon = self.document.create_element("div").ok()?;
        icon.set_class_name("empty-state-icon");
        icon.set_text_content(Some("📚"));

        let title = self.document.create_element("div").ok()?;
        title.set_text_content(Some(EMPTY_TITLE));

        let hint = self.document.create_element("div").ok()?;
        hint.set_class_name("empty-state-hint");
        hint.set_text_content(Some(&self.settings.borrow().usage_hint()));

        wrapper.append_child(&icon).ok()?;
        wrapper.append_child(&title).ok()?;
        wrapper.append_child(&hint).ok()?;
        Some(wrapper)
    }
}

#[wasm_bindgen]
pub async fn start_popup() {
    super::init_logging();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let (Some(count), Some(container)) = (
        document.get_element_by_id("wordCount"),
        document.get_element_by_id("wordContainer"),
    ) else {
        log::error!("Popup markup is missing #wordCount or #wordContainer");
        return;
    };

    let settings = Settings::load().await;
    let ui = PopupUi {
        document: document.clone(),
        count,
        container,
        settings: Rc::new(RefCell::new(settings)),
    };
    let sync: SharedSync = Rc::new(PopupSync::new(ActiveTab, ChromeStorage));

    setup_remove_buttons(&ui, sync.clone());
    setup_refresh_button(&ui, sync.clone());
    setup_clear_button(&ui, sync.clone());
    setup_settings_controls(&ui, sync.clone());

    let (view, source) = sync.load().await;
    log::info!("Popup showing {} words from {:?}", view.count, source);
    ui.render(&view);
}

/// One delegated listener for every row's remove button
fn setup_remove_buttons(ui: &PopupUi, sync: SharedSync) {
    let ui_clone = ui.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
        let word = event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest(".remove-btn").ok().flatten())
            .and_then(|btn| btn.get_attribute("data-word"));
        let Some(word) = word else {
            return;
        };

        let sync = sync.clone();
        let ui = ui_clone.clone();
        spawn_local(async move {
            let (view, _) = sync.remove(&word).await;
            ui.render(&view);
        });
    });
    let _ = ui
        .container
        .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_refresh_button(ui: &PopupUi, sync: SharedSync) {
    let Some(btn) = ui.document.get_element_by_id("refreshBtn") else {
        return;
    };
    let ui = ui.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
        let sync = sync.clone();
        let ui = ui.clone();
        spawn_local(async move {
            let (view, _) = sync.load().await;
            ui.render(&view);
        });
    });
    let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_clear_button(ui: &PopupUi, sync: SharedSync) {
    let Some(btn) = ui.document.get_element_by_id("clearAllBtn") else {
        return;
    };
    let ui = ui.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message(CLEAR_CONFIRMATION).ok())
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        let sync = sync.clone();
        let ui = ui.clone();
        spawn_local(async move {
            let (view, _) = sync.clear().await;
            ui.render(&view);
        });
    });
    let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Modifier picker and toast toggle, saved on every change
fn setup_settings_controls(ui: &PopupUi, sync: SharedSync) {
    let modifier = ui
        .document
        .get_element_by_id("modifierSelect")
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok());
    let toasts = ui
        .document
        .get_element_by_id("toastToggle")
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
    let (Some(modifier), Some(toasts)) = (modifier, toasts) else {
        log::warn!("Popup markup is missing the settings controls");
        return;
    };

    {
        let settings = ui.settings.borrow();
        modifier.set_value(settings.modifier.as_str());
        toasts.set_checked(settings.show_toasts);
    }

    let ui = ui.clone();
    let (modifier_clone, toasts_clone) = (modifier.clone(), toasts.clone());
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: Event| {
        let updated = {
            let mut settings = ui.settings.borrow_mut();
            if !settings.set_modifier(&modifier_clone.value()) {
                log::warn!("Unknown modifier {:?}", modifier_clone.value());
            }
            settings.show_toasts = toasts_clone.checked();
            settings.clone()
        };

        let sync = sync.clone();
        let ui = ui.clone();
        spawn_local(async move {
            updated.save().await;
            // Re-render so the empty-state hint names the new modifier
            let (view, _) = sync.load().await;
            ui.render(&view);
        });
    });
    let _ = modifier.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
    let _ = toasts.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
    closure.forget();
}
