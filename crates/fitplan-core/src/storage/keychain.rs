use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use keyring::Entry;

use super::DurableStore;

/// Keychain service name entries are filed under
pub const SERVICE_NAME: &str = "fitplan";

/// Durable store that keeps each key as its own OS keychain entry.
///
/// Entries are created lazily and reused for the lifetime of the store.
pub struct KeyringStore {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom service name (lets several profiles coexist)
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn with_entry<T>(&self, key: &str, f: impl FnOnce(&Entry) -> Result<T>) -> Result<T> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key).context("Failed to create keyring entry")?;
            entries.insert(key.to_string(), entry);
        }
        let entry = entries
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Keyring entry missing for {}", key))?;
        f(entry)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve value from keychain"),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_entry(key, |entry| {
            entry
                .set_password(value)
                .context("Failed to store value in keychain")
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete value from keychain"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;

    #[test]
    fn test_keyring_store_round_trip_through_mock_backend() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());

        let store = KeyringStore::with_service("fitplan-test");
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);

        store.set(keys::TOKEN, "T1").unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap().as_deref(), Some("T1"));

        store.remove(keys::TOKEN).unwrap();
        store.remove(keys::TOKEN).unwrap();
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    }

    // Must run without the mock test above, which swaps the process-wide builder:
    // cargo test -p fitplan-core keychain -- --ignored
    #[test]
    #[ignore = "needs an unlocked OS keychain"]
    fn test_keyring_store_values_survive_reopen() {
        let service = "fitplan-test-reopen";
        KeyringStore::with_service(service).set(keys::TOKEN, "T1").unwrap();

        let reopened = KeyringStore::with_service(service);
        assert_eq!(reopened.get(keys::TOKEN).unwrap().as_deref(), Some("T1"));

        reopened.remove(keys::TOKEN).unwrap();
        assert_eq!(KeyringStore::with_service(service).get(keys::TOKEN).unwrap(), None);
    }
}
