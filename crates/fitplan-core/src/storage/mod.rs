//! Durable key-value storage for session and preference data.
//!
//! This module provides:
//! - `DurableStore`: the key-value capability the session and theme
//!   controllers persist through
//! - `FileStore`: a JSON file in the user's data directory
//! - `KeyringStore`: entries kept in the OS keychain
//! - `MemoryStore`: a process-local store for ephemeral sessions and tests
//!
//! Values written here survive process restarts (except for `MemoryStore`).

pub mod file;
pub mod keychain;
pub mod store;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use store::{keys, DurableStore, MemoryStore};
