//! Local health server shared by the integration tests.

#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const HEALTH_BODY: &str = r#"{"status":"ok"}"#;

/// Delay used by the `/slow` route, longer than any deadline the tests set
pub const SLOW_ROUTE_DELAY: Duration = Duration::from_secs(5);

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        HEALTH_BODY,
    )
}

/// Echo the Accept-Encoding header the client sent, or "none".
async fn encoding(headers: HeaderMap) -> String {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string()
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_ROUTE_DELAY).await;
    "late"
}

async fn down() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "down")
}

fn app() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/encoding", get(encoding))
        .route("/slow", get(slow))
        .route("/down", get(down))
}

/// Start the test server on an ephemeral port of the current runtime.
pub async fn spawn_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Test server has no local address");

    tokio::spawn(async move {
        axum::serve(listener, app())
            .await
            .expect("Test server failed");
    });

    addr
}

/// Response that promises more body than it delivers
pub const TRUNCATED_RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort";

/// Start a raw TCP server that answers every connection with
/// `TRUNCATED_RESPONSE` and then closes it.
pub async fn spawn_truncated_server() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind truncating server");
    let addr = listener.local_addr().expect("Truncating server has no local address");

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                // Request headers fit in one read for these tests
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(TRUNCATED_RESPONSE).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing is listening on.
pub fn unused_addr() -> SocketAddr {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("Failed to reserve a port");
    listener.local_addr().expect("Reserved port has no address")
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}
