// tests/common/mod.rs

//! Shared helpers for integration tests: a scripted loopback HTTP
//! server standing in for attacker-controlled hosts, and collector
//! construction over a temp-dir store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tempfile::TempDir;

use kitjar::collector::Collector;
use kitjar::models::Config;
use kitjar::store::LocalStore;
use kitjar::utils::http;

#[derive(Clone)]
struct Page {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

/// A loopback server answering from a scripted page table and logging
/// every request path it sees.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    pages: Arc<Mutex<HashMap<String, Page>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, path: &str, status: u16, content_type: &'static str, body: &[u8]) {
        self.pages.lock().unwrap().insert(
            path.to_string(),
            Page {
                status,
                content_type,
                body: body.to_vec(),
            },
        );
    }

    pub fn html(&self, path: &str, body: &str) {
        self.page(path, 200, "text/html", body.as_bytes());
    }

    /// Install a directory-listing page with the given child links,
    /// including the sort controls and parent link real listings carry.
    pub fn listing(&self, path: &str, links: &[&str]) {
        let mut body = format!(
            "<html><head><title>Index of {path}</title></head>\
             <body><h1>Index of {path}</h1>\
             <a href=\"?C=M;O=A\">Last modified</a>\
             <a href=\"../\">Parent Directory</a>"
        );
        for link in links {
            body.push_str(&format!("<a href=\"{link}\">{link}</a>"));
        }
        body.push_str("</body></html>");
        self.html(path, &body);
    }

    pub fn zip(&self, path: &str, body: &[u8]) {
        self.page(path, 200, "application/zip", body);
    }

    pub fn text(&self, path: &str, body: &str) {
        self.page(path, 200, "text/plain", body.as_bytes());
    }

    /// How many times a path was requested.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    fn respond(&self, path: &str) -> Response {
        self.requests.lock().unwrap().push(path.to_string());
        let page = self.pages.lock().unwrap().get(path).cloned();
        match page {
            Some(page) => Response::builder()
                .status(page.status)
                .header(header::CONTENT_TYPE, page.content_type)
                .body(Body::from(page.body))
                .unwrap(),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    /// Bind an ephemeral port and serve the page table forever.
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = self.clone();
        let app = Router::new().fallback(move |uri: Uri| {
            let state = state.clone();
            async move { state.respond(uri.path()) }
        });

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        addr
    }
}

/// A config pointing kit downloads and the record store at a temp dir.
pub fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.collector.kit_directory = tmp.path().join("kits").to_string_lossy().into_owned();
    config.storage.data_dir = tmp.path().join("data").to_string_lossy().into_owned();
    config
}

/// Build a collector and its backing store from a config.
pub async fn build_collector(config: Config) -> (Arc<Collector>, Arc<LocalStore>) {
    let config = Arc::new(config);
    let store = Arc::new(LocalStore::open(&config.storage.data_dir).await.unwrap());
    let client = http::create_client(&config.collector).unwrap();
    let collector = Arc::new(Collector::new(config, client, store.clone(), store.clone()));
    (collector, store)
}
