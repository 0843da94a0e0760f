//! PocketSense Web Server
//!
//! Axum-based REST API in front of the inference pipeline:
//! - `POST /categorize` `{description}` -> `{category}`
//! - `POST /generate_insights` `{transactions, budgets}` -> `[Insight]`
//! - `GET /health` -> `{backend, model, host}`
//!
//! Pipeline failures are mapped to HTTP statuses in `AppError`; bodies are
//! always `{"error": message}`.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use pocketsense_core::{Error as CoreError, InsightPipeline};

mod handlers;

/// Origins allowed when `POCKETSENSE_ALLOWED_ORIGINS` is not set (local dev servers)
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
];

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Read `POCKETSENSE_ALLOWED_ORIGINS` (comma-separated), else the defaults
    pub fn from_env() -> Self {
        match std::env::var("POCKETSENSE_ALLOWED_ORIGINS") {
            Ok(value) => Self::with_origins(&value),
            Err(_) => Self::default(),
        }
    }

    pub fn with_origins(list: &str) -> Self {
        Self {
            allowed_origins: list
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub pipeline: InsightPipeline,
}

/// Create the application router
pub fn create_router(pipeline: InsightPipeline, config: ServerConfig) -> Router {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let state = Arc::new(AppState { pipeline });

    Router::new()
        .route("/categorize", post(handlers::categorize))
        .route("/generate_insights", post(handlers::generate_insights))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(
    pipeline: InsightPipeline,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_backend_connection(&pipeline).await;

    let app = create_router(pipeline, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log inference backend status; the server starts either way
async fn check_backend_connection(pipeline: &InsightPipeline) {
    let client = pipeline.client();
    if pipeline.health().await.is_ready() {
        info!(
            "✅ Inference backend connected: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        warn!(
            "⚠️  Inference backend not responding: {} (model: {})",
            client.host(),
            client.model()
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<CoreError>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::TimeoutExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
            CoreError::ConnectionFailed { .. } => StatusCode::BAD_GATEWAY,
            CoreError::BackendRejected { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            CoreError::InvalidInsightFormat { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::Config(_)
            | CoreError::Prompt(_)
            | CoreError::Io(_)
            | CoreError::Json(_)
            | CoreError::Toml(_) => {
                return Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    // Return generic message to client
                    message: "An internal error occurred".to_string(),
                    internal: Some(err),
                };
            }
        };

        Self {
            status,
            message: err.to_string(),
            internal: None,
        }
    }
}
