//! User preferences
//!
//! Persisted in extension storage under their own key, separate from the
//! word list. Any field missing from the stored object takes its default.

use serde::{Deserialize, Serialize};

use crate::consts::{SETTINGS_KEY, TOAST_DURATION_MS};

/// Key that arms the save/remove gesture while hovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ModifierKey {
    #[default]
    Control,
    Alt,
    Shift,
    Meta,
}

impl ModifierKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKey::Control => "Ctrl",
            ModifierKey::Alt => "Alt",
            ModifierKey::Shift => "Shift",
            ModifierKey::Meta => "Meta",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "control" | "ctrl" => Some(ModifierKey::Control),
            "alt" | "option" => Some(ModifierKey::Alt),
            "shift" => Some(ModifierKey::Shift),
            "meta" | "cmd" | "command" => Some(ModifierKey::Meta),
            _ => None,
        }
    }

    /// Value of `KeyboardEvent.key` for this modifier
    pub fn key_name(&self) -> &'static str {
        match self {
            ModifierKey::Control => "Control",
            ModifierKey::Alt => "Alt",
            ModifierKey::Shift => "Shift",
            ModifierKey::Meta => "Meta",
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        key == self.key_name()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Modifier held while hovering to save or remove a word
    pub modifier: ModifierKey,
    /// Show a toast after each add/remove
    pub show_toasts: bool,
    /// How long a toast stays visible
    pub toast_duration_ms: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            modifier: ModifierKey::Control,
            show_toasts: true,
            toast_duration_ms: TOAST_DURATION_MS,
        }
    }
}

impl Settings {
    /// Parse the stored object, falling back to defaults on garbage
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Invalid stored settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Plain struct of scalars; serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Apply a modifier picked in the popup, by name.
    ///
    /// Returns false and leaves the setting alone if the name is unknown.
    pub fn set_modifier(&mut self, name: &str) -> bool {
        match ModifierKey::from_str(name) {
            Some(modifier) => {
                self.modifier = modifier;
                true
            }
            None => false,
        }
    }

    /// Hint shown in the popup's empty state
    pub fn usage_hint(&self) -> String {
        format!(
            "Start collecting words by using {}+Hover on any webpage!",
            self.modifier.as_str()
        )
    }

    /// Load settings from extension storage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub async fn load() -> Self {
        match crate::platform::chrome::storage_get_json(SETTINGS_KEY).await {
            Ok(Some(json)) => {
                log::info!("Loaded settings from extension storage");
                Self::from_json(&json)
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Could not read settings: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to extension storage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub async fn save(&self) {
        match crate::platform::chrome::storage_set_json(SETTINGS_KEY, &self.to_json()).await {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Could not save settings: {}", e),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub async fn load() -> Self {
        log::debug!("No extension storage for {:?}, using defaults", SETTINGS_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub async fn save(&self) {
        // No-op for native
    }
}
