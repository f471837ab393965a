//! Requests to bearer-protected endpoints.
//!
//! Every request reads the token from durable storage immediately before
//! dispatch. A missing token or a 401 response logs the session out before
//! the error is returned, so no stale credential outlives the failure.

use reqwest::multipart::Form;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::auth::SessionController;
use crate::models::{
    DashboardData, FitnessPlan, ImageUpload, PlanGenerationRequest, PlansResponse, UploadReceipt,
};

use super::AuthError;

/// Request body for an authenticated call
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

/// Method and body of an authenticated request.
///
/// Headers cannot be set here; the wrapper owns `Authorization`.
#[derive(Debug)]
pub struct RequestOptions {
    method: Method,
    body: RequestBody,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: RequestBody::Empty,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// Attach a JSON body. Fails if `body` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, AuthError> {
        let value = serde_json::to_value(body)
            .map_err(|e| AuthError::InvalidRequest(format!("request body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Client for bearer-protected endpoints, bound to a session.
#[derive(Clone)]
pub struct AuthenticatedClient {
    session: SessionController,
}

impl AuthenticatedClient {
    pub fn new(session: SessionController) -> Self {
        Self { session }
    }

    /// Send a request with the stored bearer token.
    ///
    /// - No stored token: logs out, returns `AuthenticationRequired`, sends nothing.
    /// - 401: logs out and returns `SessionExpired`, whatever the body says.
    /// - Other non-2xx: `ServerRejected` with the body's message or the status text.
    /// - 2xx: the raw response.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Response, AuthError> {
        let token = match self.session.durable_token() {
            Some(token) => token,
            None => {
                warn!(endpoint, "No token found for authenticated request, forcing logout");
                self.session.logout();
                return Err(AuthError::AuthenticationRequired);
            }
        };

        let builder = self
            .session
            .api()
            .request(options.method, endpoint)
            .bearer_auth(&token);
        let builder = match options.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(endpoint, error = %e, "Authenticated request failed to send");
                return Err(AuthError::TransportFailure(e));
            }
        };

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "Authenticated request completed");

        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "Token expired or invalid, forcing logout");
            self.session.logout();
            return Err(AuthError::SessionExpired);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = AuthError::from_status(status, &body);
            error!(endpoint, status = status.as_u16(), error = %err, "API error");
            return Err(err);
        }

        Ok(response)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, AuthError> {
        let response = self.request(endpoint, options).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("{}: {}", endpoint, e)))
    }

    // ===== Protected Endpoints =====

    /// Fetch the personalized dashboard
    pub async fn fetch_dashboard(&self) -> Result<DashboardData, AuthError> {
        self.request_json("/dashboard", RequestOptions::get()).await
    }

    /// Upload a progress image
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<UploadReceipt, AuthError> {
        debug!(file = upload.file_name(), bytes = upload.len(), "Uploading image");
        let form = upload.into_form()?;
        self.request_json("/upload", RequestOptions::post().multipart(form))
            .await
    }

    /// Fetch the user's current diet and workout plans
    pub async fn fetch_plan(&self) -> Result<Vec<FitnessPlan>, AuthError> {
        let resp: PlansResponse = self.request_json("/plan", RequestOptions::get()).await?;
        Ok(resp.plans)
    }

    /// Ask the server to generate plans for a free-form goal description
    pub async fn generate_plan(&self, prompt: &str) -> Result<Vec<FitnessPlan>, AuthError> {
        let options = RequestOptions::post().json(&PlanGenerationRequest {
            user_prompt: prompt,
        })?;
        let resp: PlansResponse = self.request_json("/generate-plan", options).await?;
        Ok(resp.plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::SessionPhase;
    use crate::storage::{keys, DurableStore, MemoryStore};
    use crate::test_support::{closed_base_url, serve};
    use axum::{
        http::{header, HeaderMap},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn logged_in(base_url: &str) -> (SessionController, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::TOKEN, "T1").unwrap();
        store.set(keys::SUBJECT, "a@b.com").unwrap();
        let session = SessionController::new(ApiClient::new(base_url).unwrap(), store.clone());
        session.initialize();
        (session, store)
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// `/dashboard` answering `status` with a raw `body`, counting hits
    fn dashboard_router(
        status: axum::http::StatusCode,
        body: &'static str,
        hits: Arc<AtomicUsize>,
    ) -> Router {
        Router::new().route(
            "/api/dashboard",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (status, [(header::CONTENT_TYPE, "application/json")], body)
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_no_token_forces_logout_without_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(dashboard_router(axum::http::StatusCode::OK, "{}", hits.clone())).await;
        let (session, store) = logged_in(&base);
        // Another writer removed the token; the in-memory session still holds it
        store.remove(keys::TOKEN).unwrap();
        assert!(session.is_authenticated());

        let err = session.authenticated().fetch_dashboard().await.unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationRequired));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.get(keys::SUBJECT).unwrap(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_forces_logout_regardless_of_body() {
        for body in [r#"{"message": "still fine"}"#, "{malformed", ""] {
            let hits = Arc::new(AtomicUsize::new(0));
            let base = serve(dashboard_router(
                axum::http::StatusCode::UNAUTHORIZED,
                body,
                hits.clone(),
            ))
            .await;
            let (session, store) = logged_in(&base);

            let err = session.authenticated().fetch_dashboard().await.unwrap_err();

            assert!(matches!(err, AuthError::SessionExpired), "body {:?}", body);
            assert_eq!(hits.load(Ordering::SeqCst), 1);
            assert_eq!(session.phase(), SessionPhase::Anonymous);
            assert_eq!(store.get(keys::TOKEN).unwrap(), None);
            assert_eq!(store.get(keys::SUBJECT).unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_uses_latest_stored_token() {
        let router = Router::new().route(
            "/api/dashboard",
            get(|headers: HeaderMap| async move {
                match bearer(&headers).as_deref() {
                    Some("Bearer T2") => (
                        axum::http::StatusCode::OK,
                        Json(json!({"message": "hi", "user_name": "a@b.com"})),
                    ),
                    _ => (
                        axum::http::StatusCode::UNAUTHORIZED,
                        Json(json!({"message": "bad token"})),
                    ),
                }
            }),
        );
        let base = serve(router).await;
        let (session, store) = logged_in(&base);
        store.set(keys::TOKEN, "T2").unwrap();

        let data = session.authenticated().fetch_dashboard().await.unwrap();

        assert_eq!(data.user_name, "a@b.com");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_wins_over_in_flight_request() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (entered_tx, release_rx) = (entered.clone(), release.clone());
        let router = Router::new().route(
            "/api/dashboard",
            get(move || {
                let (entered, release) = (entered_tx.clone(), release_rx.clone());
                async move {
                    entered.notify_one();
                    release.notified().await;
                    Json(json!({"message": "hi"}))
                }
            }),
        );
        let base = serve(router).await;
        let (session, store) = logged_in(&base);

        let task = tokio::spawn({
            let client = session.authenticated();
            async move { client.fetch_dashboard().await }
        });
        entered.notified().await;
        session.logout();
        release.notify_one();

        assert!(task.await.unwrap().is_ok());
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(session.state().credential, None);
        assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_error_uses_message_or_status_text() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(dashboard_router(
            axum::http::StatusCode::BAD_REQUEST,
            r#"{"message": "Invalid request"}"#,
            hits.clone(),
        ))
        .await;
        let (session, _store) = logged_in(&base);
        let err = session.authenticated().fetch_dashboard().await.unwrap_err();
        assert_eq!(err.server_message(), Some("Invalid request"));
        assert!(session.is_authenticated());

        let base = serve(dashboard_router(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "<html>down</html>",
            hits,
        ))
        .await;
        let (session, _store) = logged_in(&base);
        let err = session.authenticated().fetch_dashboard().await.unwrap_err();
        assert_eq!(err.server_message(), Some("Service Unavailable"));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_success_returns_raw_response() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(dashboard_router(
            axum::http::StatusCode::OK,
            r#"{"anything": true}"#,
            hits,
        ))
        .await;
        let (session, _store) = logged_in(&base);

        let response = session
            .authenticated()
            .request("/dashboard", RequestOptions::get())
            .await
            .unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), r#"{"anything": true}"#);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_session() {
        let base = closed_base_url().await;
        let (session, _store) = logged_in(&base);

        let err = session.authenticated().fetch_dashboard().await.unwrap_err();

        assert!(matches!(err, AuthError::TransportFailure(_)));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_undecodable_success_body_is_invalid_response() {
        let hits = Arc::new(AtomicUsize::new(0));
        let base = serve(dashboard_router(axum::http::StatusCode::OK, "[1, 2]", hits)).await;
        let (session, _store) = logged_in(&base);

        let err = session.authenticated().fetch_dashboard().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_with_bearer() {
        let router = Router::new().route(
            "/api/upload",
            post(|headers: HeaderMap| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if bearer(&headers).as_deref() == Some("Bearer T1")
                    && content_type.starts_with("multipart/form-data")
                {
                    (
                        axum::http::StatusCode::OK,
                        Json(json!({"message": "Image uploaded successfully", "filename": "user_1_1.png"})),
                    )
                } else {
                    (
                        axum::http::StatusCode::BAD_REQUEST,
                        Json(json!({"message": "Error retrieving file from form"})),
                    )
                }
            }),
        );
        let base = serve(router).await;
        let (session, _store) = logged_in(&base);
        let upload = ImageUpload::new("progress.png", vec![0x89, b'P', b'N', b'G']).unwrap();

        let receipt = session.authenticated().upload_image(upload).await.unwrap();

        assert_eq!(receipt.message, "Image uploaded successfully");
        assert_eq!(receipt.filename, "user_1_1.png");
    }

    #[tokio::test]
    async fn test_generate_plan_posts_prompt() {
        let router = Router::new().route(
            "/api/generate-plan",
            post(|Json(body): Json<serde_json::Value>| async move {
                let prompt = body["user_prompt"].as_str().unwrap_or_default().to_string();
                Json(json!({"plans": [
                    {"type": "Diet", "title": "Personalized AI Diet Plan", "description": prompt},
                    {"type": "Workout", "title": "Personalized AI Workout Routine", "description": ""}
                ]}))
            }),
        );
        let base = serve(router).await;
        let (session, _store) = logged_in(&base);

        let plans = session
            .authenticated()
            .generate_plan("run a 10k")
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].description, "run a 10k");
        assert_eq!(plans[1].title, "Personalized AI Workout Routine");
    }

    #[test]
    fn test_json_body_that_cannot_serialize_is_invalid_request() {
        let mut body = std::collections::HashMap::new();
        body.insert((1, 2), "non-string keys have no JSON form");

        let err = RequestOptions::post().json(&body).unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest(_)));

        let options = RequestOptions::post().json(&json!({"user_prompt": "x"})).unwrap();
        assert!(matches!(options.body, RequestBody::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_plan() {
        let router = Router::new().route(
            "/api/plan",
            get(|| async {
                Json(json!({"plans": [
                    {"type": "Diet", "title": "Your Current Diet Plan", "description": "Lean proteins."}
                ]}))
            }),
        );
        let base = serve(router).await;
        let (session, _store) = logged_in(&base);

        let plans = session.authenticated().fetch_plan().await.unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].title, "Your Current Diet Plan");
    }
}
