//! Runtime settings shared by every surface.

use serde::{Deserialize, Serialize};

/// How blocked containers are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Collapse blocked containers entirely.
    #[default]
    Hide,
    /// Obscure blocked containers behind a reveal control.
    Blur,
}

/// Process-wide settings, persisted in the synced store.
///
/// Missing fields fall back to the defaults so partially written stores
/// stay usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub display_mode: DisplayMode,
    /// Match any URL inside the container, not just the primary anchor.
    pub strict_mode: bool,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            display_mode: DisplayMode::Hide,
            strict_mode: false,
            debug_mode: false,
        }
    }
}
