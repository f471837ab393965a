//! Light/dark theme preference.
//!
//! The mode is read from durable storage at startup, falling back to the
//! system preference when nothing valid is stored. Every change is written
//! back immediately.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::{keys, DurableStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            other => Err(format!("unknown theme mode: {}", other)),
        }
    }
}

/// Holds the current theme mode and persists changes.
pub struct ThemeController {
    store: Arc<dyn DurableStore>,
    mode: ThemeMode,
}

impl ThemeController {
    /// Load the stored mode, or use `system_preference` if none is stored
    pub fn load(store: Arc<dyn DurableStore>, system_preference: ThemeMode) -> Self {
        let stored = match store.get(keys::THEME_MODE) {
            Ok(value) => value.and_then(|v| v.parse::<ThemeMode>().ok()),
            Err(e) => {
                warn!(error = %e, "Failed to read theme mode");
                None
            }
        };
        let mode = stored.unwrap_or(system_preference);
        debug!(%mode, from_storage = stored.is_some(), "Theme mode loaded");
        Self { store, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Flip between light and dark, returning the new mode
    pub fn toggle(&mut self) -> ThemeMode {
        self.set(self.mode.flipped())
    }

    pub fn set(&mut self, mode: ThemeMode) -> ThemeMode {
        self.mode = mode;
        if let Err(e) = self.store.set(keys::THEME_MODE, mode.as_str()) {
            warn!(error = %e, "Failed to save theme mode");
        }
        mode
    }
}
