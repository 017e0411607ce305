use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_name, validate_text};

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(Category::list(&state.db).await?))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<Category>>, ApiError> {
    Ok(Json(Category::find(&state.db, id).await?))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    req.name = req.name.trim().to_string();

    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_name(&req.name, "Category name"));
    errors.check("description", validate_text(&req.description, "Description", 1000));
    errors.finish()?;

    let category = Category::insert(&state.db, &req).await?;
    tracing::info!(category_id = category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    req.name = req.name.map(|n| n.trim().to_string());

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_name(name, "Category name"));
    }
    errors.check(
        "description",
        validate_text(&req.description.clone().flatten(), "Description", 1000),
    );
    errors.finish()?;

    let category = Category::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Category", id))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = Category::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "category"))?;

    if !deleted {
        return Err(ApiError::missing("Category", id));
    }
    tracing::info!(category_id = id, "Category deleted");

    Ok(StatusCode::NO_CONTENT)
}
