use serde::{Deserialize, Serialize};

use crate::prefs::PreferenceStore;

pub const KEY_CITY: &str = "city";
pub const KEY_TEMPERATURE: &str = "temp";
pub const KEY_CONDITION: &str = "condition";
pub const KEY_HUMIDITY: &str = "humidity";
pub const KEY_WIND: &str = "wind";
pub const KEY_ICON_URL: &str = "icon_url";

pub const DEFAULT_CITY: &str = "Город";
pub const DEFAULT_TEMPERATURE: &str = "20°C";
pub const DEFAULT_ICON_URL: &str = "//cdn.example/icons/default.png";

/// Cached weather fields, read fresh from the preference store for every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub city: String,
    pub temperature: String,
    pub condition: String,
    pub humidity: String,
    pub wind: String,
    pub icon_url: String,
}

impl PreferenceSnapshot {
    /// Read all six fields. Missing, mistyped or blank values take the field default.
    pub fn read(store: &dyn PreferenceStore) -> Self {
        Self {
            city: field(store, KEY_CITY, DEFAULT_CITY),
            temperature: field(store, KEY_TEMPERATURE, DEFAULT_TEMPERATURE),
            condition: field(store, KEY_CONDITION, ""),
            humidity: field(store, KEY_HUMIDITY, ""),
            wind: field(store, KEY_WIND, ""),
            icon_url: field(store, KEY_ICON_URL, DEFAULT_ICON_URL),
        }
    }
}

impl Default for PreferenceSnapshot {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            temperature: DEFAULT_TEMPERATURE.to_string(),
            condition: String::new(),
            humidity: String::new(),
            wind: String::new(),
            icon_url: DEFAULT_ICON_URL.to_string(),
        }
    }
}

fn field(store: &dyn PreferenceStore, key: &str, default: &str) -> String {
    let value = store.get_string(key, default);
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
