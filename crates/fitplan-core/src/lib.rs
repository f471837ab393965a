//! Core library for fitplan, the diet and fitness client.
//!
//! - `auth`: session lifecycle (startup check, login, register, logout)
//! - `api`: HTTP client and the authenticated request wrapper
//! - `storage`: durable key-value backends
//! - `theme`: light/dark preference
//! - `models`: API request and response bodies
//! - `config`: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod theme;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, AuthError, AuthenticatedClient, RequestOptions};
pub use auth::{Credential, SessionController, SessionPhase, SessionState};
pub use config::{Config, StorageBackend};
pub use storage::{DurableStore, FileStore, KeyringStore, MemoryStore};
pub use theme::{ThemeController, ThemeMode};
