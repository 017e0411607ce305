//! Location endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateLocationRequest, Location, UpdateLocationRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{clean_optional, validate_branch_code, validate_name, validate_text};

fn validate_create_request(req: &CreateLocationRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_name(&req.name, "Location name"));
    errors.check("branch_code", validate_branch_code(&req.branch_code));
    errors.check("address", validate_text(&req.address, "Address", 500));
    errors.check("description", validate_text(&req.description, "Description", 1000));
    errors.finish()
}

fn validate_update_request(req: &UpdateLocationRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_name(name, "Location name"));
    }
    errors.check("branch_code", validate_branch_code(&req.branch_code.clone().flatten()));
    errors.check("address", validate_text(&req.address.clone().flatten(), "Address", 500));
    errors.check(
        "description",
        validate_text(&req.description.clone().flatten(), "Description", 1000),
    );
    errors.finish()
}

pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(Location::list(&state.db).await?))
}

/// Returns `null` for an unknown id
pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<Location>>, ApiError> {
    Ok(Json(Location::find(&state.db, id).await?))
}

pub async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    req.name = req.name.trim().to_string();
    req.branch_code = clean_optional(req.branch_code);
    validate_create_request(&req)?;

    let location = Location::insert(&state.db, &req).await?;
    tracing::info!(location_id = location.id, name = %location.name, "Location created");

    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    req.name = req.name.map(|n| n.trim().to_string());
    req.branch_code = req.branch_code.map(clean_optional);
    validate_update_request(&req)?;

    let location = Location::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Location", id))?;
    tracing::info!(location_id = id, "Location updated");

    Ok(Json(location))
}

pub async fn delete_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = Location::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "location"))?;

    if !deleted {
        return Err(ApiError::missing("Location", id));
    }
    tracing::info!(location_id = id, "Location deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_category, seed_item, seed_location, test_state};

    fn create_req(name: &str) -> CreateLocationRequest {
        CreateLocationRequest {
            name: name.to_string(),
            branch_code: Some("HQ".to_string()),
            address: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn test_empty_list_and_missing_get() {
        let state = test_state().await;
        let Json(all) = list_locations(State(state.clone())).await.unwrap();
        assert!(all.is_empty());

        let Json(found) = get_location(State(state), Path(42)).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_create_returns_persisted_row() {
        let state = test_state().await;
        let (status, Json(location)) =
            create_location(State(state.clone()), Json(create_req("  Head Office ")))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert!(location.id > 0);
        assert_eq!(location.name, "Head Office");
        assert_eq!(location.branch_code.as_deref(), Some("HQ"));
        assert!(!location.created_at.is_empty());

        let Json(found) = get_location(State(state), Path(location.id)).await.unwrap();
        assert_eq!(found.unwrap().name, "Head Office");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let state = test_state().await;
        let err = create_location(State(state), Json(create_req("  ")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let state = test_state().await;
        let (_, Json(location)) = create_location(State(state.clone()), Json(create_req("Annex")))
            .await
            .unwrap();

        let Json(updated) = update_location(
            State(state),
            Path(location.id),
            Json(UpdateLocationRequest {
                address: Some(Some("12 Main St".to_string())),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Annex");
        assert_eq!(updated.branch_code.as_deref(), Some("HQ"));
        assert_eq!(updated.address.as_deref(), Some("12 Main St"));
    }

    #[tokio::test]
    async fn test_update_clears_branch_code() {
        let state = test_state().await;
        let (_, Json(location)) = create_location(State(state.clone()), Json(create_req("Annex")))
            .await
            .unwrap();
        assert_eq!(location.branch_code.as_deref(), Some("HQ"));

        let Json(updated) = update_location(
            State(state.clone()),
            Path(location.id),
            Json(serde_json::from_str(r#"{"branch_code": null}"#).unwrap()),
        )
        .await
        .unwrap();
        assert!(updated.branch_code.is_none());
        assert_eq!(updated.name, "Annex");

        let Json(found) = get_location(State(state), Path(location.id)).await.unwrap();
        assert!(found.unwrap().branch_code.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let state = test_state().await;
        let err = update_location(State(state), Path(9), Json(UpdateLocationRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Location with ID 9 does not exist");
    }

    #[tokio::test]
    async fn test_delete_referenced_location_fails() {
        let state = test_state().await;
        let category = seed_category(&state, "Laptops").await;
        let used = seed_location(&state, "Warehouse").await;
        let unused = seed_location(&state, "Empty Room").await;
        seed_item(&state, "LAP-001", category.id, used.id).await;

        let err = delete_location(State(state.clone()), Path(used.id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(Location::find(&state.db, used.id).await.unwrap().is_some());

        let status = delete_location(State(state.clone()), Path(unused.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(Location::find(&state.db, unused.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let state = test_state().await;
        seed_location(&state, "Lab").await;
        let mut req = create_req("Lab");
        req.branch_code = None;
        let err = create_location(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
