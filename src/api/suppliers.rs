//! Supplier endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::db::{CreateSupplierRequest, Supplier, UpdateSupplierRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    clean_optional, validate_email, validate_name, validate_phone, validate_text,
};

fn validate_contact_fields(
    errors: &mut ValidationErrorBuilder,
    contact_person: &Option<String>,
    email: &Option<String>,
    phone: &Option<String>,
    address: &Option<String>,
) {
    errors.check("contact_person", validate_text(contact_person, "Contact person", 200));
    errors.check("email", validate_email(email));
    errors.check("phone", validate_phone(phone));
    errors.check("address", validate_text(address, "Address", 500));
}

pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Supplier>>, ApiError> {
    Ok(Json(Supplier::list(&state.db).await?))
}

pub async fn get_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<Supplier>>, ApiError> {
    Ok(Json(Supplier::find(&state.db, id).await?))
}

pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), ApiError> {
    req.name = req.name.trim().to_string();
    req.email = clean_optional(req.email);
    req.phone = clean_optional(req.phone);

    let mut errors = ValidationErrorBuilder::new();
    errors.check("name", validate_name(&req.name, "Supplier name"));
    validate_contact_fields(
        &mut errors,
        &req.contact_person,
        &req.email,
        &req.phone,
        &req.address,
    );
    errors.finish()?;

    let supplier = Supplier::insert(&state.db, &req).await?;
    tracing::info!(supplier_id = supplier.id, name = %supplier.name, "Supplier created");

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateSupplierRequest>,
) -> Result<Json<Supplier>, ApiError> {
    req.name = req.name.map(|n| n.trim().to_string());
    req.email = req.email.map(clean_optional);
    req.phone = req.phone.map(clean_optional);

    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref name) = req.name {
        errors.check("name", validate_name(name, "Supplier name"));
    }
    validate_contact_fields(
        &mut errors,
        &req.contact_person.clone().flatten(),
        &req.email.clone().flatten(),
        &req.phone.clone().flatten(),
        &req.address.clone().flatten(),
    );
    errors.finish()?;

    let supplier = Supplier::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Supplier", id))?;
    tracing::info!(supplier_id = id, "Supplier updated");

    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = Supplier::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "supplier"))?;

    if !deleted {
        return Err(ApiError::missing("Supplier", id));
    }
    tracing::info!(supplier_id = id, "Supplier deleted");

    Ok(StatusCode::NO_CONTENT)
}
