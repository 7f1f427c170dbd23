//! External store contract.
//!
//! Settings live in a synced key-value area, rules in a local one. Reads
//! and writes are best-effort with last-write-wins semantics; there is no
//! retry, and malformed or missing values fall back to defaults rather than
//! erroring. Change notifications arrive as [`StoreChange`] values and are
//! fed to the observer.

use std::collections::HashMap;

use rb_core::settings::Settings;
use serde_json::Value;

pub const SETTINGS_KEY: &str = "settings";
pub const RULES_KEY: &str = "rules";

/// A change reported by the external store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Settings(Settings),
    Rules(Vec<String>),
}

/// JSON-valued key-value store. Host adapters wrap the real persistence
/// layer; [`MemoryStore`] serves tests and the CLI.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);

    fn load_settings(&self) -> Settings {
        self.get(SETTINGS_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    fn save_settings(&mut self, settings: &Settings) {
        if let Ok(value) = serde_json::to_value(settings) {
            self.set(SETTINGS_KEY, value);
        }
    }

    fn load_rules(&self) -> Vec<String> {
        self.get(RULES_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    fn save_rules(&mut self, rules: &[String]) {
        if let Ok(value) = serde_json::to_value(rules) {
            self.set(RULES_KEY, value);
        }
    }

    /// Install-time seeding: write the current (or default) values back so
    /// the expected keys exist.
    fn ensure_defaults(&mut self) {
        let settings = self.load_settings();
        self.save_settings(&settings);
        let rules = self.load_rules();
        self.save_rules(&rules);
    }
}

/// In-memory store used by tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }
}
