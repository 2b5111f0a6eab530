//! Shared fixtures for registry integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

/// Write a `{ "data": [...] }` document and return its path.
pub fn write_source(dir: &Path, file: &str, pairs: &[(&str, &str)]) -> PathBuf {
    let data: Vec<serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| serde_json::json!({ "key": k, "value": v }))
        .collect();
    let path = dir.join(file);
    fs::write(&path, serde_json::json!({ "data": data }).to_string()).unwrap();
    path
}

/// Body of a `{ "data": [...] }` document.
pub fn document(pairs: &[(&str, &str)]) -> String {
    let data: Vec<serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| serde_json::json!({ "key": k, "value": v }))
        .collect();
    serde_json::json!({ "data": data }).to_string()
}

/// Serve the same canned response to every request on an ephemeral port.
///
/// Returns the base URL. The server task lives until the runtime shuts down.
pub async fn serve(status: u16, body: String) -> String {
    serve_with_delay(status, body, Duration::ZERO).await
}

/// Like [`serve`], but waits `delay` before answering.
pub async fn serve_with_delay(status: u16, body: String, delay: Duration) -> String {
    let status = StatusCode::from_u16(status).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = Bytes::from(body);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let io = TokioIo::new(stream);
            let body = body.clone();

            tokio::spawn(async move {
                let service = service_fn(move |_req| {
                    let body = body.clone();
                    async move {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        Response::builder()
                            .status(status)
                            .header("content-type", "application/json")
                            .body(Full::new(body))
                    }
                });

                let _ = http1::Builder::new().serve_connection(io, service).await;
            });
        }
    });

    format!("http://{addr}")
}
