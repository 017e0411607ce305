//! Purchase endpoints. `total_price` is always derived server-side.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{
    CreatePurchaseRequest, DbPool, InventoryItem, Purchase, PurchaseDetail, Supplier,
    UpdatePurchaseRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    clean_optional, normalize_date, normalize_optional_date, validate_price,
    validate_purchase_quantity, validate_text,
};

async fn check_references(
    db: &DbPool,
    item_id: Option<i64>,
    supplier_id: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(id) = item_id {
        if InventoryItem::find(db, id).await?.is_none() {
            return Err(ApiError::missing("Inventory item", id));
        }
    }
    if let Some(id) = supplier_id {
        if !Supplier::exists(db, id).await? {
            return Err(ApiError::missing("Supplier", id));
        }
    }
    Ok(())
}

pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PurchaseDetail>>, ApiError> {
    Ok(Json(Purchase::list(&state.db).await?))
}

pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<PurchaseDetail>>, ApiError> {
    Ok(Json(Purchase::find_detail(&state.db, id).await?))
}

pub async fn create_purchase(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>), ApiError> {
    req.invoice_number = clean_optional(req.invoice_number);

    let mut errors = ValidationErrorBuilder::new();
    errors.check("quantity", validate_purchase_quantity(req.quantity));
    errors.check("unit_price", validate_price(req.unit_price));
    errors.check("invoice_number", validate_text(&req.invoice_number, "Invoice number", 100));
    errors.check("notes", validate_text(&req.notes, "Notes", 2000));
    match normalize_date(&req.purchase_date) {
        Ok(date) => req.purchase_date = date,
        Err(e) => {
            errors.add("purchase_date", e);
        }
    }
    errors.finish()?;

    check_references(&state.db, Some(req.item_id), Some(req.supplier_id)).await?;

    let purchase = Purchase::insert(&state.db, &req).await?;
    tracing::info!(
        purchase_id = purchase.id,
        item_id = purchase.item_id,
        total_price = purchase.total_price,
        "Purchase recorded"
    );

    Ok((StatusCode::CREATED, Json(purchase)))
}

pub async fn update_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdatePurchaseRequest>,
) -> Result<Json<Purchase>, ApiError> {
    req.invoice_number = req.invoice_number.map(clean_optional);

    let mut errors = ValidationErrorBuilder::new();
    if let Some(quantity) = req.quantity {
        errors.check("quantity", validate_purchase_quantity(quantity));
    }
    if let Some(price) = req.unit_price {
        errors.check("unit_price", validate_price(price));
    }
    errors.check(
        "invoice_number",
        validate_text(&req.invoice_number.clone().flatten(), "Invoice number", 100),
    );
    errors.check("notes", validate_text(&req.notes.clone().flatten(), "Notes", 2000));
    normalize_optional_date(&mut req.purchase_date, "purchase_date", &mut errors);
    errors.finish()?;

    check_references(&state.db, req.item_id, req.supplier_id).await?;

    let purchase = Purchase::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Purchase", id))?;
    tracing::info!(purchase_id = id, total_price = purchase.total_price, "Purchase updated");

    Ok(Json(purchase))
}

pub async fn delete_purchase(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = Purchase::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "purchase"))?;

    if !deleted {
        return Err(ApiError::missing("Purchase", id));
    }
    tracing::info!(purchase_id = id, "Purchase deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_category, seed_item, seed_location, seed_supplier, test_state};

    async fn fixtures(state: &AppState) -> (i64, i64) {
        let category = seed_category(state, "Laptops").await;
        let location = seed_location(state, "HQ").await;
        let supplier = seed_supplier(state, "Acme").await;
        let item = seed_item(state, "LAP-001", category.id, location.id).await;
        (item.id, supplier.id)
    }

    fn create_req(item_id: i64, supplier_id: i64) -> CreatePurchaseRequest {
        CreatePurchaseRequest {
            item_id,
            supplier_id,
            quantity: 5,
            unit_price: 25.50,
            purchase_date: "2024-04-02".to_string(),
            invoice_number: Some("INV-1001".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_total() {
        let state = test_state().await;
        let (item_id, supplier_id) = fixtures(&state).await;

        let (status, Json(purchase)) =
            create_purchase(State(state.clone()), Json(create_req(item_id, supplier_id)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(purchase.total_price, 127.50);

        let Json(detail) = get_purchase(State(state), Path(purchase.id)).await.unwrap();
        let detail = detail.unwrap();
        assert_eq!(detail.item_code, "LAP-001");
        assert_eq!(detail.supplier_name, "Acme");
    }

    #[tokio::test]
    async fn test_update_recomputes_total_from_merged_values() {
        let state = test_state().await;
        let (item_id, supplier_id) = fixtures(&state).await;
        let (_, Json(purchase)) =
            create_purchase(State(state.clone()), Json(create_req(item_id, supplier_id)))
                .await
                .unwrap();

        let Json(updated) = update_purchase(
            State(state.clone()),
            Path(purchase.id),
            Json(UpdatePurchaseRequest {
                quantity: Some(2),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.unit_price, 25.50);
        assert_eq!(updated.total_price, 51.0);

        let Json(updated) = update_purchase(
            State(state),
            Path(purchase.id),
            Json(UpdatePurchaseRequest {
                unit_price: Some(10.0),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(updated.total_price, 20.0);
    }

    #[tokio::test]
    async fn test_update_clears_invoice_number() {
        let state = test_state().await;
        let (item_id, supplier_id) = fixtures(&state).await;
        let (_, Json(purchase)) =
            create_purchase(State(state.clone()), Json(create_req(item_id, supplier_id)))
                .await
                .unwrap();
        assert_eq!(purchase.invoice_number.as_deref(), Some("INV-1001"));

        let Json(updated) = update_purchase(
            State(state),
            Path(purchase.id),
            Json(UpdatePurchaseRequest {
                invoice_number: Some(Some(String::new())),
                notes: Some(Some("Paid by card".to_string())),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert!(updated.invoice_number.is_none());
        assert_eq!(updated.notes.as_deref(), Some("Paid by card"));
        assert_eq!(updated.total_price, 127.50);
    }

    #[tokio::test]
    async fn test_create_rejects_zero_quantity_and_unknown_supplier() {
        let state = test_state().await;
        let (item_id, supplier_id) = fixtures(&state).await;

        let mut req = create_req(item_id, supplier_id);
        req.quantity = 0;
        let err = create_purchase(State(state.clone()), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = create_purchase(State(state), Json(create_req(item_id, 404)))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Supplier with ID 404 does not exist");
    }

    #[tokio::test]
    async fn test_supplier_with_purchases_cannot_be_deleted() {
        let state = test_state().await;
        let (item_id, supplier_id) = fixtures(&state).await;
        let (_, Json(purchase)) =
            create_purchase(State(state.clone()), Json(create_req(item_id, supplier_id)))
                .await
                .unwrap();

        let err = crate::api::suppliers::delete_supplier(State(state.clone()), Path(supplier_id))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        delete_purchase(State(state.clone()), Path(purchase.id))
            .await
            .unwrap();
        let status = crate::api::suppliers::delete_supplier(State(state), Path(supplier_id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
