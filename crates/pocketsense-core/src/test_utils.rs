//! Test utilities for pocketsense-core
//!
//! `MockOllamaServer` speaks just enough of the Ollama HTTP API
//! (`/api/tags`, `/api/generate`) to drive `OllamaBackend` end to end.
//! Replies are scripted per request; with an empty script it answers like
//! `MockBackend` does.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::ai::canned_reply;
use crate::prompts::PromptPair;

/// One scripted answer from `/api/generate`
#[derive(Debug, Clone)]
pub enum ServerReply {
    /// 200 with `{"response": text, ...}`
    Text(String),
    /// Non-2xx status with a plain-text body
    Error { status: u16, body: String },
    /// 200 with this raw body instead of an Ollama envelope
    Malformed(String),
    /// Wait, then send the inner reply
    Delayed(Duration, Box<ServerReply>),
}

impl ServerReply {
    pub fn text(text: impl Into<String>) -> Self {
        ServerReply::Text(text.into())
    }

    pub fn error(status: u16, body: impl Into<String>) -> Self {
        ServerReply::Error {
            status,
            body: body.into(),
        }
    }

    pub fn stall(delay: Duration) -> Self {
        ServerReply::Delayed(delay, Box::new(ServerReply::text("[]")))
    }
}

#[derive(Default)]
struct ServerState {
    unhealthy: AtomicBool,
    replies: Mutex<VecDeque<ServerReply>>,
    tags_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    requests: Mutex<Vec<serde_json::Value>>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Start with a script of replies
    pub async fn with_replies(replies: impl IntoIterator<Item = ServerReply>) -> Self {
        let server = Self::start().await;
        for reply in replies {
            server.push(reply);
        }
        server
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn push(&self, reply: ServerReply) {
        self.state.replies.lock().unwrap().push_back(reply);
    }

    /// When unhealthy, `/api/tags` answers 503
    pub fn set_healthy(&self, healthy: bool) {
        self.state.unhealthy.store(!healthy, Ordering::SeqCst);
    }

    pub fn tags_calls(&self) -> usize {
        self.state.tags_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.state.generate_calls.load(Ordering::SeqCst)
    }

    /// JSON body of the most recent `/api/generate` request
    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.state.requests.lock().unwrap().last().cloned()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

/// Ollama tags endpoint (health check)
async fn handle_tags(State(state): State<Arc<ServerState>>) -> Response {
    state.tags_calls.fetch_add(1, Ordering::SeqCst);
    if state.unhealthy.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "ollama is starting").into_response();
    }
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "mistral:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_100_000_000,
        }],
    })
    .into_response()
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<serde_json::Value>,
) -> Response {
    state.generate_calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(request.clone());

    let field = |name: &str| {
        request
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };
    let model = field("model");
    let scripted = state.replies.lock().unwrap().pop_front();

    let mut reply = scripted.unwrap_or_else(|| {
        ServerReply::Text(canned_reply(&PromptPair {
            system: field("system"),
            user: field("prompt"),
        }))
    });

    loop {
        match reply {
            ServerReply::Text(response) => {
                return Json(GenerateResponse {
                    model,
                    response,
                    done: true,
                })
                .into_response();
            }
            ServerReply::Error { status, body } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                return (status, body).into_response();
            }
            ServerReply::Malformed(body) => {
                return (
                    StatusCode::OK,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response();
            }
            ServerReply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}
