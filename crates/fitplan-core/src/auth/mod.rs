//! Authentication module for managing the client-side session.
//!
//! This module provides:
//! - `Session`: the in-memory credential holder, mirrored to durable storage
//! - `SessionController`: login, registration, logout and the startup check
//!
//! The session moves from `Unknown` to `Anonymous` or `Authenticated` once
//! the startup check runs, then between the latter two on login and logout.

pub mod controller;
pub mod session;

pub use controller::SessionController;
pub use session::{Credential, Session, SessionPhase, SessionState};
