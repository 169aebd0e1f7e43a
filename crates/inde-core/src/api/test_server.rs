//! One-shot HTTP server for exercising the client over a real socket.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::ApiClient;
use crate::auth::{HistoryNavigator, MemoryCookieStore, Session};
use crate::config::{ApiEnvironment, Mode};

/// Accept one connection, answer it with `status` and a JSON `body`, and
/// hand back the raw request head.
pub async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.expect("read");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&head).into_owned()
    });

    (format!("http://{}", addr), handle)
}

/// Client for `base_url` that bypasses any proxy from the environment.
pub fn local_client(base_url: &str, start: &str) -> (ApiClient, Arc<HistoryNavigator>) {
    let session = Session::new(Arc::new(MemoryCookieStore::new()), false);
    let navigator = Arc::new(HistoryNavigator::new(start));
    let env = ApiEnvironment::new(Some(base_url.to_string()), Mode::Development);
    let client = ApiClient::with_builder(reqwest::Client::builder().no_proxy(), env, session, navigator.clone())
        .expect("client builds");
    (client, navigator)
}

/// Header lines of a request head, lowercased.
pub fn header_lines(head: &str) -> Vec<String> {
    head.lines().skip(1).map(str::to_ascii_lowercase).collect()
}
