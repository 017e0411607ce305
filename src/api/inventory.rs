//! Inventory item endpoints, including tab-delimited batch import.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{
    Category, CreateCategoryRequest, CreateInventoryItemRequest, CreateLocationRequest, DbPool,
    InventoryItem, InventoryItemDetail, ItemCondition, Location, LocationHistory,
    LocationHistoryDetail, UpdateInventoryItemRequest,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{
    normalize_date, normalize_optional_date, validate_item_code, validate_name, validate_price,
    validate_quantity, validate_text,
};

/// Make sure the referenced category and location rows exist
async fn check_references(
    db: &DbPool,
    category_id: Option<i64>,
    location_id: Option<i64>,
) -> Result<(), ApiError> {
    if let Some(id) = category_id {
        if !Category::exists(db, id).await? {
            return Err(ApiError::missing("Category", id));
        }
    }
    if let Some(id) = location_id {
        if !Location::exists(db, id).await? {
            return Err(ApiError::missing("Location", id));
        }
    }
    Ok(())
}

async fn ensure_code_free(db: &DbPool, code: &str, except_id: Option<i64>) -> Result<(), ApiError> {
    if InventoryItem::code_taken(db, code, except_id).await? {
        return Err(ApiError::conflict(format!(
            "Item code '{}' is already in use",
            code
        )));
    }
    Ok(())
}

fn validate_create_request(req: &mut CreateInventoryItemRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    errors.check("item_code", validate_item_code(&req.item_code));
    errors.check("name", validate_name(&req.name, "Item name"));
    errors.check("description", validate_text(&req.description, "Description", 2000));
    errors.check("quantity", validate_quantity(req.quantity));
    errors.check("purchase_price", validate_price(req.purchase_price));
    match normalize_date(&req.purchase_date) {
        Ok(date) => req.purchase_date = date,
        Err(e) => {
            errors.add("purchase_date", e);
        }
    }
    errors.finish()
}

fn validate_update_request(req: &mut UpdateInventoryItemRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Some(ref code) = req.item_code {
        errors.check("item_code", validate_item_code(code));
    }
    if let Some(ref name) = req.name {
        errors.check("name", validate_name(name, "Item name"));
    }
    errors.check(
        "description",
        validate_text(&req.description.clone().flatten(), "Description", 2000),
    );
    if let Some(quantity) = req.quantity {
        errors.check("quantity", validate_quantity(quantity));
    }
    if let Some(price) = req.purchase_price {
        errors.check("purchase_price", validate_price(price));
    }
    normalize_optional_date(&mut req.purchase_date, "purchase_date", &mut errors);
    errors.finish()
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InventoryItemDetail>>, ApiError> {
    Ok(Json(InventoryItem::list(&state.db).await?))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Option<InventoryItemDetail>>, ApiError> {
    Ok(Json(InventoryItem::find_detail(&state.db, id).await?))
}

/// Transfer history of a single item, oldest first
pub async fn get_item_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<LocationHistoryDetail>>, ApiError> {
    if InventoryItem::find(&state.db, id).await?.is_none() {
        return Err(ApiError::missing("Inventory item", id));
    }
    Ok(Json(LocationHistory::list_for_item(&state.db, id).await?))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<CreateInventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    req.item_code = req.item_code.trim().to_string();
    req.name = req.name.trim().to_string();
    validate_create_request(&mut req)?;

    check_references(&state.db, Some(req.category_id), Some(req.location_id)).await?;
    ensure_code_free(&state.db, &req.item_code, None).await?;

    let item = InventoryItem::insert(&state.db, &req).await?;
    tracing::info!(item_id = item.id, item_code = %item.item_code, "Inventory item created");

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(mut req): Json<UpdateInventoryItemRequest>,
) -> Result<Json<InventoryItem>, ApiError> {
    req.item_code = req.item_code.map(|c| c.trim().to_string());
    req.name = req.name.map(|n| n.trim().to_string());
    validate_update_request(&mut req)?;

    if InventoryItem::find(&state.db, id).await?.is_none() {
        return Err(ApiError::missing("Inventory item", id));
    }
    check_references(&state.db, req.category_id, req.location_id).await?;
    if let Some(ref code) = req.item_code {
        ensure_code_free(&state.db, code, Some(id)).await?;
    }

    let item = InventoryItem::update(&state.db, id, &req)
        .await?
        .ok_or_else(|| ApiError::missing("Inventory item", id))?;
    tracing::info!(item_id = id, "Inventory item updated");

    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = InventoryItem::delete(&state.db, id)
        .await
        .map_err(|e| ApiError::from_delete(e, "inventory item"))?;

    if !deleted {
        return Err(ApiError::missing("Inventory item", id));
    }
    tracing::info!(item_id = id, "Inventory item deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Batch import
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BatchImportRequest {
    /// Tab-delimited rows: item code, name, description, category, location,
    /// condition, quantity, price, purchase date
    pub content: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct BatchImportError {
    /// 1-based line number within `content`
    pub line: usize,
    pub item_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BatchImportResponse {
    pub success_count: usize,
    pub errors: Vec<BatchImportError>,
}

/// One parsed import row, with category and location still given by name
#[derive(Debug, Clone, PartialEq)]
struct BatchRow {
    item_code: String,
    name: String,
    description: Option<String>,
    category: String,
    location: String,
    condition: ItemCondition,
    quantity: i64,
    purchase_price: f64,
    purchase_date: String,
}

const MIN_COLUMNS: usize = 5;

fn is_header(line: &str) -> bool {
    let first = line.split('\t').next().unwrap_or("").trim().to_lowercase();
    first == "item_code" || first == "code"
}

fn cell(cells: &[&str], index: usize) -> Option<String> {
    cells
        .get(index)
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(String::from)
}

/// Parse one tab-delimited line. Trailing columns may be left out: condition
/// defaults to good, quantity to 1, price to 0 and the date to `today`.
fn parse_row(line: &str, today: &str) -> Result<BatchRow, String> {
    let cells: Vec<&str> = line.split('\t').collect();
    if cells.len() < MIN_COLUMNS {
        return Err(format!(
            "Expected at least {} tab-separated columns, found {}",
            MIN_COLUMNS,
            cells.len()
        ));
    }

    let item_code = cell(&cells, 0).ok_or("Item code is required")?;
    validate_item_code(&item_code)?;
    let name = cell(&cells, 1).ok_or("Item name is required")?;
    validate_name(&name, "Item name")?;
    let category = cell(&cells, 3).ok_or("Category name is required")?;
    validate_name(&category, "Category name")?;
    let location = cell(&cells, 4).ok_or("Location name is required")?;
    validate_name(&location, "Location name")?;

    let condition = match cell(&cells, 5) {
        Some(c) => c.parse::<ItemCondition>()?,
        None => ItemCondition::default(),
    };

    let quantity = match cell(&cells, 6) {
        Some(q) => q
            .parse::<i64>()
            .map_err(|_| format!("Invalid quantity '{}'", q))?,
        None => 1,
    };
    validate_quantity(quantity)?;

    let purchase_price = match cell(&cells, 7) {
        Some(p) => p
            .trim_start_matches('$')
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| format!("Invalid price '{}'", p))?,
        None => 0.0,
    };
    validate_price(purchase_price)?;

    let purchase_date = match cell(&cells, 8) {
        Some(d) => normalize_date(&d)?,
        None => today.to_string(),
    };

    Ok(BatchRow {
        item_code,
        name,
        description: cell(&cells, 2),
        category,
        location,
        condition,
        quantity,
        purchase_price,
        purchase_date,
    })
}

async fn category_id_for(db: &DbPool, name: &str) -> Result<i64, sqlx::Error> {
    if let Some(category) = Category::find_by_name(db, name).await? {
        return Ok(category.id);
    }
    let category = Category::insert(
        db,
        &CreateCategoryRequest {
            name: name.to_string(),
            description: None,
        },
    )
    .await?;
    tracing::info!(category_id = category.id, name = name, "Category created by import");
    Ok(category.id)
}

async fn location_id_for(db: &DbPool, name: &str) -> Result<i64, sqlx::Error> {
    if let Some(location) = Location::find_by_name(db, name).await? {
        return Ok(location.id);
    }
    let location = Location::insert(
        db,
        &CreateLocationRequest {
            name: name.to_string(),
            branch_code: None,
            address: None,
            description: None,
        },
    )
    .await?;
    tracing::info!(location_id = location.id, name = name, "Location created by import");
    Ok(location.id)
}

async fn import_row(db: &DbPool, row: BatchRow) -> Result<InventoryItem, ApiError> {
    ensure_code_free(db, &row.item_code, None).await?;

    let category_id = category_id_for(db, &row.category).await?;
    let location_id = location_id_for(db, &row.location).await?;

    let item = InventoryItem::insert(
        db,
        &CreateInventoryItemRequest {
            item_code: row.item_code,
            name: row.name,
            description: row.description,
            category_id,
            location_id,
            condition: row.condition,
            quantity: row.quantity,
            purchase_price: row.purchase_price,
            purchase_date: row.purchase_date,
        },
    )
    .await?;
    Ok(item)
}

/// Import items row by row. A failing row is reported and skipped; the rest
/// of the batch still goes in.
pub async fn batch_import(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchImportRequest>,
) -> Result<Json<BatchImportResponse>, ApiError> {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let mut success_count = 0;
    let mut errors = Vec::new();

    for (index, line) in req.content.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        if success_count == 0 && errors.is_empty() && is_header(line) {
            continue;
        }

        let code_hint = cell(&line.split('\t').collect::<Vec<_>>(), 0);

        let outcome = match parse_row(line, &today) {
            Ok(row) => import_row(&state.db, row).await,
            Err(message) => Err(ApiError::bad_request(message)),
        };

        match outcome {
            Ok(item) => {
                tracing::debug!(item_id = item.id, line = line_number, "Imported item");
                success_count += 1;
            }
            Err(e) => errors.push(BatchImportError {
                line: line_number,
                item_code: code_hint,
                message: e.message().to_string(),
            }),
        }
    }

    tracing::info!(
        success_count = success_count,
        error_count = errors.len(),
        "Batch import finished"
    );

    Ok(Json(BatchImportResponse {
        success_count,
        errors,
    }))
}
