use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;

/// Keys written to durable storage.
pub mod keys {
    /// Bearer token of the active session
    pub const TOKEN: &str = "jwtToken";
    /// Email of the authenticated user
    pub const SUBJECT: &str = "userEmail";
    /// Persisted theme mode, `"light"` or `"dark"`
    pub const THEME_MODE: &str = "themeMode";
}

/// A device-local key-value store that survives process restarts.
///
/// Implementations must be safe to share between tasks. Reads always go to
/// the backing medium so callers observe the latest persisted value.
pub trait DurableStore: Send + Sync {
    /// Read a value, returning `None` if the key was never written or was removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store. Nothing is persisted beyond the lifetime of the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
