//! Session lifecycle: startup check, login, registration and logout.
//!
//! `SessionController` is the single owner of the session. It is created
//! once at startup and handed to every consumer; clones share the same
//! state. The session lock is only held for in-memory and storage updates,
//! never across a network call.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, AuthError, AuthenticatedClient};
use crate::storage::{keys, DurableStore};

use super::session::{Credential, Session, SessionPhase, SessionState};

struct Inner {
    api: ApiClient,
    store: Arc<dyn DurableStore>,
    session: RwLock<Session>,
    in_flight: AtomicUsize,
}

/// Handle to the client-side authentication session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

/// Counts a login/register call as in flight until dropped
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SessionController {
    pub fn new(api: ApiClient, store: Arc<dyn DurableStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                session: RwLock::new(Session::new()),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.inner.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub(crate) fn store(&self) -> &dyn DurableStore {
        self.inner.store.as_ref()
    }

    /// Run the one-time startup check of durable storage.
    ///
    /// Later calls do nothing and return the current phase. A storage
    /// failure is logged and leaves the session anonymous.
    pub fn initialize(&self) -> SessionPhase {
        let mut session = self.write();
        if !session.is_initializing() {
            return session.phase();
        }

        match session.load(self.store()) {
            Ok(true) => info!("Found stored session"),
            Ok(false) => debug!("No stored session found"),
            Err(e) => warn!(error = %e, "Failed to read stored session"),
        }
        session.finish_initializing();
        session.phase()
    }

    /// Log in with an email and password.
    ///
    /// On success the credential is held in memory and persisted. A failed
    /// attempt leaves the session as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let _busy = BusyGuard::new(&self.inner.in_flight);
        debug!(email, "Attempting login");

        let response = match self.api().login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e);
            }
        };

        // Older servers omit the email; the submitted one identifies the user
        let subject = if response.email.is_empty() {
            email.to_string()
        } else {
            response.email
        };
        let credential = Credential::new(response.token, subject).ok_or_else(|| {
            AuthError::InvalidResponse("login response is missing the token or email".to_string())
        })?;

        let mut session = self.write();
        session.update(credential);
        session.finish_initializing();
        if let Err(e) = session.save(self.store()) {
            warn!(error = %e, "Failed to save session");
        }
        info!("Login successful");
        Ok(())
    }

    /// Create an account. Never changes the session, even on success.
    pub async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let _busy = BusyGuard::new(&self.inner.in_flight);
        debug!(email, "Attempting registration");

        match self.api().register(email, password).await {
            Ok(message) => {
                info!("Registration successful");
                Ok(message)
            }
            Err(e) => {
                error!(error = %e, "Registration failed");
                Err(e)
            }
        }
    }

    /// Drop the session in memory and in durable storage. Idempotent.
    pub fn logout(&self) {
        let mut session = self.write();
        let was_authenticated = session.phase() == SessionPhase::Authenticated;
        session.finish_initializing();
        if let Err(e) = session.clear(self.store()) {
            warn!(error = %e, "Failed to clear stored session");
        }
        if was_authenticated {
            info!("Logged out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    pub fn phase(&self) -> SessionPhase {
        self.read().phase()
    }

    pub fn state(&self) -> SessionState {
        self.read().state()
    }

    /// Email of the logged-in user
    pub fn subject(&self) -> Option<String> {
        self.read().subject().map(str::to_string)
    }

    /// True while a login or register call is in flight.
    ///
    /// Front ends use this to disable submission; the controller itself
    /// does not reject concurrent calls.
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Read the token straight from durable storage.
    ///
    /// Authenticated requests use this rather than the in-memory session so
    /// they always present the latest persisted token.
    pub fn durable_token(&self) -> Option<String> {
        match self.store().get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// Wrapper for requests to bearer-protected endpoints
    pub fn authenticated(&self) -> AuthenticatedClient {
        AuthenticatedClient::new(self.clone())
    }
}
