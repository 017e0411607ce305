//! Read-only report endpoints. Every report is computed from the current
//! rows on each request; nothing is cached.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::db::{
    reports, ConditionSummary, DateRangeQuery, InventoryItemDetail, InventoryReportQuery,
    LocationHistoryDetail, LocationSummary, MonthlyPurchaseSummary, SupplierPurchaseSummary,
    TransferReportQuery,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::normalize_optional_date;

/// Coerce both ends of a date range to `YYYY-MM-DD` and make sure they are
/// in order.
fn normalize_range(start: &mut Option<String>, end: &mut Option<String>) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    normalize_optional_date(start, "start_date", &mut errors);
    normalize_optional_date(end, "end_date", &mut errors);
    errors.finish()?;

    if let (Some(s), Some(e)) = (start.as_ref(), end.as_ref()) {
        if s > e {
            return Err(ApiError::validation_field(
                "end_date",
                "End date must not be before start date",
            ));
        }
    }
    Ok(())
}

pub async fn inventory_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InventoryReportQuery>,
) -> Result<Json<Vec<InventoryItemDetail>>, ApiError> {
    Ok(Json(reports::inventory_report(&state.db, &query).await?))
}

pub async fn purchases_by_supplier(
    State(state): State<Arc<AppState>>,
    Query(mut range): Query<DateRangeQuery>,
) -> Result<Json<Vec<SupplierPurchaseSummary>>, ApiError> {
    normalize_range(&mut range.start_date, &mut range.end_date)?;
    Ok(Json(reports::purchases_by_supplier(&state.db, &range).await?))
}

pub async fn purchases_by_month(
    State(state): State<Arc<AppState>>,
    Query(mut range): Query<DateRangeQuery>,
) -> Result<Json<Vec<MonthlyPurchaseSummary>>, ApiError> {
    normalize_range(&mut range.start_date, &mut range.end_date)?;
    Ok(Json(reports::purchases_by_month(&state.db, &range).await?))
}

pub async fn transfer_report(
    State(state): State<Arc<AppState>>,
    Query(mut query): Query<TransferReportQuery>,
) -> Result<Json<Vec<LocationHistoryDetail>>, ApiError> {
    normalize_range(&mut query.start_date, &mut query.end_date)?;
    Ok(Json(reports::transfer_report(&state.db, &query).await?))
}

pub async fn condition_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConditionSummary>>, ApiError> {
    Ok(Json(reports::condition_summary(&state.db).await?))
}

pub async fn location_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationSummary>>, ApiError> {
    Ok(Json(reports::location_summary(&state.db).await?))
}
