//! Fake completion servers for adapter tests.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral local port; returns its base URL.
pub(crate) async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{addr}")
}

/// Base URL of a local port nothing listens on.
pub(crate) fn unused_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
