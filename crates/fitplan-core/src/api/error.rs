use reqwest::StatusCode;
use thiserror::Error;

use crate::models::MessageResponse;

/// Failures surfaced by the session controller and authenticated requests.
///
/// None of these are fatal. `AuthenticationRequired` and `SessionExpired`
/// are returned only after the session has been logged out.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error or server unreachable")]
    TransportFailure(#[from] reqwest::Error),

    #[error("{0}")]
    ServerRejected(String),

    #[error("Authentication required: no token found")]
    AuthenticationRequired,

    #[error("Unauthorized: session expired or invalid token")]
    SessionExpired,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for server messages carried in errors
const MAX_ERROR_MESSAGE_LENGTH: usize = 500;

impl AuthError {
    /// Truncate a message to avoid carrying excessive data, on a char boundary
    fn truncate_message(message: &str) -> String {
        if message.len() <= MAX_ERROR_MESSAGE_LENGTH {
            return message.to_string();
        }
        let mut end = MAX_ERROR_MESSAGE_LENGTH;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &message[..end],
            message.len()
        )
    }

    /// Rejection for a login/register call, using `fallback` when the body has no message
    pub fn rejected(body: &str, fallback: &str) -> Self {
        let parsed = MessageResponse::parse(body);
        let message = parsed.text().unwrap_or(fallback);
        AuthError::ServerRejected(Self::truncate_message(message))
    }

    /// Rejection for a non-2xx, non-401 authenticated response.
    ///
    /// Falls back to the status text when the body carries no message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let parsed = MessageResponse::parse(body);
        let message = match parsed.text() {
            Some(message) => message.to_string(),
            None => match status.canonical_reason() {
                Some(reason) => reason.to_string(),
                None => format!("API error: {}", status.as_u16()),
            },
        };
        AuthError::ServerRejected(Self::truncate_message(&message))
    }

    /// Server-supplied message for a rejection
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AuthError::ServerRejected(message) => Some(message),
            _ => None,
        }
    }

    /// Whether this failure came with a forced logout
    pub fn forces_logout(&self) -> bool {
        matches!(
            self,
            AuthError::AuthenticationRequired | AuthError::SessionExpired
        )
    }
}
