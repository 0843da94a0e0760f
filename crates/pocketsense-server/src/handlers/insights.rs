//! Insight generation handler

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::{AppError, AppState};
use pocketsense_core::{FinancialSnapshot, Insight};

/// POST /generate_insights - Generate insights from transactions and budgets
///
/// Errors are never downgraded to an empty list; an empty array only comes
/// back when the model itself returned one.
pub async fn generate_insights(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<FinancialSnapshot>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let run = state.pipeline.generate_insights_detailed(&snapshot).await?;

    info!(
        count = run.insights.len(),
        attempts = run.attempts,
        "Generated insights"
    );

    Ok(Json(run.insights))
}
