//! Shared helpers: an in-process stand-in for the Ollama API.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ollama_relay::config::BackendConfig;
use ollama_relay::relay::OllamaClient;

/// How the mock answers `/api/generate` and `/api/pull`.
#[derive(Clone)]
pub enum Reply {
    Json(StatusCode, Value),
    Text(StatusCode, &'static str),
    Slow(Duration),
}

#[derive(Clone)]
struct MockState {
    generate: Reply,
    pull: Reply,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

/// A running mock backing server.
pub struct MockOllama {
    pub base_url: String,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

impl MockOllama {
    pub async fn start(generate: Reply, pull: Reply) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            generate,
            pull,
            received: received.clone(),
        };

        let router = Router::new()
            .route("/api/version", get(|| async { Json(json!({"version": "0.5.7"})) }))
            .route("/api/generate", post(generate_handler))
            .route("/api/pull", post(pull_handler))
            .with_state(state);

        let base_url = serve(router).await;
        Self { base_url, received }
    }

    /// Backing server that answers generate with `{"response": text}`.
    pub async fn answering(text: &str) -> Self {
        Self::start(
            Reply::Json(StatusCode::OK, json!({"model": "llama3.2", "response": text, "done": true})),
            Reply::Json(StatusCode::OK, json!({"status": "success"})),
        )
        .await
    }

    /// Request bodies received so far, tagged by path.
    pub fn received(&self) -> Vec<(String, Value)> {
        self.received.lock().unwrap().clone()
    }
}

async fn respond(reply: Reply) -> Response {
    match reply {
        Reply::Json(status, body) => (status, Json(body)).into_response(),
        Reply::Text(status, body) => (status, body).into_response(),
        Reply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({"response": "too late"})).into_response()
        }
    }
}

async fn generate_handler(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state
        .received
        .lock()
        .unwrap()
        .push(("/api/generate".to_string(), body));
    respond(state.generate.clone()).await
}

async fn pull_handler(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state
        .received
        .lock()
        .unwrap()
        .push(("/api/pull".to_string(), body));
    respond(state.pull.clone()).await
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL on which nothing listens.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
        pull_timeout_secs: 5,
        ..Default::default()
    }
}

pub fn client(base_url: &str) -> OllamaClient {
    OllamaClient::new(&backend_config(base_url)).unwrap()
}
