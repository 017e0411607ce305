use axum::{extract::State, Json};
use std::sync::Arc;

use crate::db::{reports, DashboardStats};
use crate::AppState;

use super::error::ApiError;

/// Aggregate counts for the dashboard, recomputed on every call
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(reports::dashboard_stats(&state.db).await?))
}
