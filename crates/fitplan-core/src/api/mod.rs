//! REST API client module for the diet-fitness server.
//!
//! This module provides the `ApiClient` for the account endpoints and the
//! `AuthenticatedClient` for endpoints that require a bearer token.
//!
//! Tokens are JWTs issued by `/login` and presented as
//! `Authorization: Bearer <token>`.

pub mod authenticated;
pub mod client;
pub mod error;

pub use authenticated::{AuthenticatedClient, RequestBody, RequestOptions};
pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::AuthError;
