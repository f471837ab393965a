//! Stub HTTP servers for exercising the client against canned responses.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port and return the API base URL.
///
/// Routes are expected under `/api`, matching the real server.
pub(crate) async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

/// A base URL nothing is listening on
pub(crate) async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}
