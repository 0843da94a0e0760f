//! Transaction categorization handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use pocketsense_core::Category;

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CategorizeResponse {
    pub category: Category,
}

/// POST /categorize - Assign one category label to a transaction description
///
/// Any string gets a label; output the model can't place resolves to `Other`.
pub async fn categorize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CategorizeRequest>,
) -> Result<Json<CategorizeResponse>, AppError> {
    let category = state.pipeline.categorize(&request.description).await?;
    Ok(Json(CategorizeResponse { category }))
}
