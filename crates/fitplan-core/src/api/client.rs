//! HTTP client for the diet-fitness REST API.
//!
//! `ApiClient` performs the unauthenticated account calls (`/login`,
//! `/register`) and dispatches requests prepared by the authenticated
//! wrapper. It never stores a token itself.

use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, RequestBuilder};
use tracing::debug;

use crate::models::{Credentials, LoginResponse, MessageResponse};

use super::AuthError;

// ============================================================================
// Constants
// ============================================================================

/// Default API root (the server mounts every route under `/api`)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_FALLBACK: &str = "Login failed: Unknown error.";
const REGISTER_FALLBACK: &str = "Registration failed: Unknown error.";
const REGISTER_SUCCESS: &str = "Registration successful!";

/// API client for the diet-fitness server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given API root, e.g. `http://localhost:8080/api`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint such as `/dashboard`
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Start a request to an endpoint. The caller adds any credentials.
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client.request(method, self.url(endpoint))
    }

    /// Exchange an email and password for a token via `POST /login`.
    ///
    /// A 2xx response without a token is an `InvalidResponse`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let url = self.url("/login");
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Login response received");

        if !status.is_success() {
            return Err(AuthError::rejected(&body, LOGIN_FALLBACK));
        }

        let login: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("login response: {}", e)))?;
        if login.token.is_empty() {
            return Err(AuthError::InvalidResponse(
                "login response did not include a token".to_string(),
            ));
        }
        Ok(login)
    }

    /// Create an account via `POST /register`, returning the server's message
    pub async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let url = self.url("/register");
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&Credentials { email, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Register response received");

        if !status.is_success() {
            return Err(AuthError::rejected(&body, REGISTER_FALLBACK));
        }

        let parsed = MessageResponse::parse(&body);
        Ok(parsed.text().unwrap_or(REGISTER_SUCCESS).to_string())
    }
}
