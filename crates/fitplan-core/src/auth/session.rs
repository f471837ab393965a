use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::{keys, DurableStore};

/// Token and identity of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub subject: String,
}

impl Credential {
    /// Build a credential, refusing an empty token or subject
    pub fn new(token: impl Into<String>, subject: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let subject = subject.into();
        if token.is_empty() || subject.is_empty() {
            return None;
        }
        Some(Self { token, subject })
    }
}

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// The startup check of durable storage has not run yet
    Unknown,
    Anonymous,
    Authenticated,
}

/// Snapshot of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub credential: Option<Credential>,
    pub initializing: bool,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match (&self.credential, self.initializing) {
            (Some(_), _) => SessionPhase::Authenticated,
            (None, true) => SessionPhase::Unknown,
            (None, false) => SessionPhase::Anonymous,
        }
    }
}

/// In-memory holder for the current credential.
///
/// `load`, `save` and `clear` mirror it to durable storage as two
/// independent entries (`jwtToken`, `userEmail`).
#[derive(Debug)]
pub struct Session {
    credential: Option<Credential>,
    initializing: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            credential: None,
            initializing: true,
        }
    }

    /// Load the persisted credential. Returns true if both entries were present.
    pub fn load(&mut self, store: &dyn DurableStore) -> Result<bool> {
        let token = store.get(keys::TOKEN)?.unwrap_or_default();
        let subject = store.get(keys::SUBJECT)?.unwrap_or_default();

        match Credential::new(token, subject) {
            Some(credential) => {
                self.credential = Some(credential);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Persist the current credential, if any.
    ///
    /// Storage never keeps a token without its subject: if the subject
    /// cannot be written, the token just written is removed again.
    pub fn save(&self, store: &dyn DurableStore) -> Result<()> {
        let Some(ref credential) = self.credential else {
            return Ok(());
        };
        store.set(keys::TOKEN, &credential.token)?;
        if let Err(e) = store.set(keys::SUBJECT, &credential.subject) {
            if let Err(rollback) = store.remove(keys::TOKEN) {
                warn!(error = %rollback, "Failed to roll back stored token");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Forget the credential in memory, then remove both persisted entries.
    ///
    /// The in-memory credential is dropped even if storage fails.
    pub fn clear(&mut self, store: &dyn DurableStore) -> Result<()> {
        self.credential = None;
        let token_result = store.remove(keys::TOKEN);
        let subject_result = store.remove(keys::SUBJECT);
        token_result.and(subject_result)
    }

    /// Replace the credential in memory
    pub fn update(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Mark the one-time startup check as done. Returns false if it already was.
    pub fn finish_initializing(&mut self) -> bool {
        std::mem::replace(&mut self.initializing, false)
    }

    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    /// Get the bearer token if a session is active
    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    /// Get the subject (email) if a session is active
    pub fn subject(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.subject.as_str())
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            credential: self.credential.clone(),
            initializing: self.initializing,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
