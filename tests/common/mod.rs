#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use sha1::{Digest, Sha1};
use tokio::net::TcpListener;

/// In-memory static file host that records every request it sees.
#[derive(Clone, Default)]
pub struct FileHost {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    total: Arc<AtomicUsize>,
}

impl FileHost {
    pub fn put(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(path.to_string(), body.into());
    }

    pub fn requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

async fn serve_path(State(host): State<FileHost>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    host.total.fetch_add(1, Ordering::SeqCst);
    *host.hits.lock().unwrap().entry(path.clone()).or_default() += 1;

    let body = host.files.lock().unwrap().get(&path).cloned();
    match body {
        Some(body) => (StatusCode::OK, body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Start serving `host` on an ephemeral port; returns `http://127.0.0.1:<port>`.
pub async fn start_server(host: FileHost) -> String {
    let app = Router::new().fallback(serve_path).with_state(host);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Manifest listing `ids` (all releases) with descriptors under `/versions/`.
pub fn manifest_json(base: &str, latest: &str, ids: &[&str]) -> String {
    let versions: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "type": "release",
                "url": format!("{base}/versions/{id}.json"),
                "releaseTime": "2023-12-07T08:00:00+00:00"
            })
        })
        .collect();
    serde_json::json!({"latest": {"release": latest}, "versions": versions}).to_string()
}
