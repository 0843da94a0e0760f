//! Backend health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use pocketsense_core::BackendHealth;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub backend: BackendHealth,
    pub model: String,
    pub host: String,
}

/// GET /health - Report backend liveness plus the configured model and host
///
/// Always 200; an unreachable backend is reported in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.pipeline.client();
    Json(HealthResponse {
        backend: state.pipeline.health().await,
        model: client.model().to_string(),
        host: client.host().to_string(),
    })
}
