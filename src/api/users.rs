//! User administration. Every endpoint here requires the admin role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateUserRequest, UpdateUserRequest, User, UserResponse, UserRole};
use crate::AppState;

use super::auth::{hash_password, require_admin};
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_password, validate_username};

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    require_admin(&user)?;
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<i64>,
) -> Result<Json<Option<UserResponse>>, ApiError> {
    require_admin(&user)?;
    let found = User::find(&state.db, id).await?;
    Ok(Json(found.map(UserResponse::from)))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(mut req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_admin(&user)?;
    req.username = req.username.trim().to_string();

    let mut errors = ValidationErrorBuilder::new();
    errors.check("username", validate_username(&req.username));
    errors.check("password", validate_password(&req.password));
    errors.finish()?;

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "Username '{}' is already taken",
            req.username
        )));
    }

    let password_hash = hash(&req.password)?;
    let created = User::insert(&state.db, &req.username, &password_hash, req.role).await?;
    tracing::info!(
        user_id = created.id,
        username = %created.username,
        role = %created.role,
        created_by = %user.username,
        "User created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(created))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_admin(&user)?;

    if let Some(ref password) = req.password {
        validate_password(password).map_err(|e| ApiError::validation_field("password", e))?;
    }
    if id == user.id && req.is_active == Some(false) {
        return Err(ApiError::bad_request("You cannot deactivate your own account"));
    }
    if id == user.id && req.role == Some(UserRole::User) {
        return Err(ApiError::bad_request("You cannot remove your own admin role"));
    }

    let password_hash = match req.password {
        Some(ref password) => Some(hash(password)?),
        None => None,
    };

    let updated = User::update(
        &state.db,
        id,
        password_hash.as_deref(),
        req.role,
        req.is_active,
    )
    .await?
    .ok_or_else(|| ApiError::missing("User", id))?;
    tracing::info!(user_id = id, updated_by = %user.username, "User updated");

    Ok(Json(UserResponse::from(updated)))
}

/// Delete a user and, through the foreign key cascade, their sessions
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&user)?;

    if id == user.id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::missing("User", id));
    }
    tracing::info!(user_id = id, deleted_by = %user.username, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
