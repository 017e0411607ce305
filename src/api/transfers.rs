//! Transfer (location history) endpoints.
//!
//! A transfer written with status `completed`, either on create or by a later
//! update, moves the item to the destination location in the same
//! transaction. Other statuses leave the item where it is.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    CreateTransferRequest, DbPool, InventoryItem, Location, LocationHistory,
    LocationHistoryDetail, NewLocationHistory, TransferStatus, UpdateTransferRequest, User,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{clean_optional, normalize_optional_date, validate_text};

async fn check_location(db: &DbPool, id: Option<i64>) -> Result<(), ApiError> {
    if let Some(id) = id {
        if !Location::exists(db, id).await? {
            return Err(ApiError::missing("Location", id));
        }
    }
    Ok(())
}

pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocationHistoryDetail>>, ApiError> {
    Ok(Json(LocationHistory::list(&state.db).await?))
}

pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<LocationHistoryDetail>>, ApiError> {
    Ok(Json(LocationHistory::find_detail(&state.db, id).await?))
}

pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(mut req): Json<CreateTransferRequest>,
) -> Result<(StatusCode, Json<LocationHistory>), ApiError> {
    req.transferred_by = clean_optional(req.transferred_by);

    let mut errors = ValidationErrorBuilder::new();
    errors.check("reason", validate_text(&req.reason, "Reason", 500));
    errors.check("notes", validate_text(&req.notes, "Notes", 2000));
    errors.check("transferred_by", validate_text(&req.transferred_by, "Transferred by", 100));
    normalize_optional_date(&mut req.transfer_date, "transfer_date", &mut errors);
    errors.finish()?;

    let item = InventoryItem::find(&state.db, req.item_id)
        .await?
        .ok_or_else(|| ApiError::missing("Inventory item", req.item_id))?;
    check_location(&state.db, req.from_location_id).await?;
    check_location(&state.db, Some(req.to_location_id)).await?;

    let transfer_date = req
        .transfer_date
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());

    let new = NewLocationHistory {
        item_id: item.id,
        from_location_id: req.from_location_id.or(Some(item.location_id)),
        to_location_id: req.to_location_id,
        transfer_date,
        transferred_by: req.transferred_by.unwrap_or_else(|| user.username.clone()),
        reason: req.reason,
        status: req.status,
        notes: req.notes,
    };

    let transfer = LocationHistory::insert(&state.db, &new).await?;
    tracing::info!(
        transfer_id = transfer.id,
        item_id = transfer.item_id,
        to_location_id = transfer.to_location_id,
        status = %transfer.status,
        "Transfer recorded"
    );
    if new.status == TransferStatus::Completed {
        tracing::info!(
            item_id = item.id,
            location_id = new.to_location_id,
            "Item moved by completed transfer"
        );
    }

    Ok((StatusCode::CREATED, Json(transfer)))
}

pub async fn update_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateTransferRequest>,
) -> Result<Json<LocationHistory>, ApiError> {
    req.transferred_by = clean_optional(req.transferred_by);

    let mut errors = ValidationErrorBuilder::new();
    errors.check("reason", validate_text(&req.reason.clone().flatten(), "Reason", 500));
    errors.check("notes", validate_text(&req.notes.clone().flatten(), "Notes", 2000));
    errors.check("transferred_by", validate_text(&req.transferred_by, "Transferred by", 100));
    normalize_optional_date(&mut req.transfer_date, "transfer_date", &mut errors);
    errors.finish()?;

    check_location(&state.db, req.from_location_id.flatten()).await?;
    check_location(&state.db, req.to_location_id).await?;

    let transfer = LocationHistory::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Transfer", id))?;

    tracing::info!(transfer_id = id, status = %transfer.status, "Transfer updated");
    if req.moves_item(transfer.status_enum()) {
        tracing::info!(
            item_id = transfer.item_id,
            location_id = transfer.to_location_id,
            "Item moved by completed transfer"
        );
    }

    Ok(Json(transfer))
}

pub async fn delete_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = LocationHistory::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "transfer"))?;

    if !deleted {
        return Err(ApiError::missing("Transfer", id));
    }
    tracing::info!(transfer_id = id, "Transfer deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRole;
    use crate::test_support::{seed_category, seed_item, seed_location, seed_user, test_state};

    struct Fixture {
        state: Arc<AppState>,
        user: User,
        item_id: i64,
        origin: i64,
        destination: i64,
    }

    async fn fixture() -> Fixture {
        let state = test_state().await;
        let user = seed_user(&state, "clerk", UserRole::User).await;
        let category = seed_category(&state, "Laptops").await;
        let origin = seed_location(&state, "Head Office").await;
        let destination = seed_location(&state, "Branch 2").await;
        let item = seed_item(&state, "LAP-001", category.id, origin.id).await;
        Fixture {
            state,
            user,
            item_id: item.id,
            origin: origin.id,
            destination: destination.id,
        }
    }

    fn create_req(item_id: i64, to_location_id: i64, status: TransferStatus) -> CreateTransferRequest {
        CreateTransferRequest {
            item_id,
            from_location_id: None,
            to_location_id,
            transfer_date: None,
            transferred_by: None,
            reason: Some("Reassignment".to_string()),
            status,
            notes: None,
        }
    }

    async fn item_location(state: &AppState, item_id: i64) -> i64 {
        InventoryItem::find(&state.db, item_id)
            .await
            .unwrap()
            .unwrap()
            .location_id
    }

    #[tokio::test]
    async fn test_completed_transfer_moves_item() {
        let f = fixture().await;

        let (status, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Completed)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(transfer.status_enum(), TransferStatus::Completed);
        assert_eq!(item_location(&f.state, f.item_id).await, f.destination);
    }

    #[tokio::test]
    async fn test_pending_transfer_fills_defaults_and_leaves_item() {
        let f = fixture().await;

        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Pending)),
        )
        .await
        .unwrap();

        assert_eq!(transfer.from_location_id, Some(f.origin));
        assert_eq!(transfer.transferred_by, "clerk");
        assert_eq!(transfer.transfer_date.len(), 10);
        assert_eq!(item_location(&f.state, f.item_id).await, f.origin);
    }

    #[tokio::test]
    async fn test_updating_to_completed_moves_item() {
        let f = fixture().await;
        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::InTransit)),
        )
        .await
        .unwrap();
        assert_eq!(item_location(&f.state, f.item_id).await, f.origin);

        let Json(updated) = update_transfer(
            State(f.state.clone()),
            Path(transfer.id),
            Json(UpdateTransferRequest {
                status: Some(TransferStatus::Completed),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, "completed");
        assert_eq!(item_location(&f.state, f.item_id).await, f.destination);

        let Json(detail) = get_transfer(State(f.state.clone()), Path(transfer.id))
            .await
            .unwrap();
        let detail = detail.unwrap();
        assert_eq!(detail.from_location_name.as_deref(), Some("Head Office"));
        assert_eq!(detail.to_location_name, "Branch 2");
        assert_eq!(detail.item_code, "LAP-001");
    }

    #[tokio::test]
    async fn test_repointing_completed_transfer_moves_item() {
        let f = fixture().await;
        let annex = seed_location(&f.state, "Annex").await;
        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Completed)),
        )
        .await
        .unwrap();
        assert_eq!(item_location(&f.state, f.item_id).await, f.destination);

        let Json(updated) = update_transfer(
            State(f.state.clone()),
            Path(transfer.id),
            Json(UpdateTransferRequest {
                to_location_id: Some(annex.id),
                notes: Some(None),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.status_enum(), TransferStatus::Completed);
        assert_eq!(updated.to_location_id, annex.id);
        assert_eq!(item_location(&f.state, f.item_id).await, annex.id);
    }

    #[tokio::test]
    async fn test_update_clears_reason() {
        let f = fixture().await;
        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Pending)),
        )
        .await
        .unwrap();
        assert_eq!(transfer.reason.as_deref(), Some("Reassignment"));

        let Json(updated) = update_transfer(
            State(f.state.clone()),
            Path(transfer.id),
            Json(serde_json::from_str(r#"{"reason": null}"#).unwrap()),
        )
        .await
        .unwrap();
        assert!(updated.reason.is_none());
        assert_eq!(updated.status, "pending");
        assert_eq!(item_location(&f.state, f.item_id).await, f.origin);
    }

    #[tokio::test]
    async fn test_cancelled_update_does_not_move_item() {
        let f = fixture().await;
        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Pending)),
        )
        .await
        .unwrap();

        update_transfer(
            State(f.state.clone()),
            Path(transfer.id),
            Json(UpdateTransferRequest {
                status: Some(TransferStatus::Cancelled),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(item_location(&f.state, f.item_id).await, f.origin);
    }

    #[tokio::test]
    async fn test_unknown_destination_is_rejected() {
        let f = fixture().await;
        let err = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, 999, TransferStatus::Completed)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Location with ID 999 does not exist");
        assert_eq!(item_location(&f.state, f.item_id).await, f.origin);
    }

    #[tokio::test]
    async fn test_item_with_transfers_cannot_be_deleted() {
        let f = fixture().await;
        let (_, Json(transfer)) = create_transfer(
            State(f.state.clone()),
            f.user.clone(),
            Json(create_req(f.item_id, f.destination, TransferStatus::Pending)),
        )
        .await
        .unwrap();

        let err = crate::api::inventory::delete_item(State(f.state.clone()), Path(f.item_id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        delete_transfer(State(f.state.clone()), Path(transfer.id))
            .await
            .unwrap();
        let Json(found) = get_transfer(State(f.state), Path(transfer.id)).await.unwrap();
        assert!(found.is_none());
    }
}
