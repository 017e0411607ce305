//! Shared fixtures for unit tests: an in-memory database and seed helpers.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{
    self, Category, CreateCategoryRequest, CreateInventoryItemRequest, CreateLocationRequest,
    CreateSupplierRequest, InventoryItem, ItemCondition, Location, Supplier, User, UserRole,
};
use crate::AppState;

pub async fn test_state() -> Arc<AppState> {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    Arc::new(AppState::new(Config::default(), pool))
}

pub async fn seed_category(state: &AppState, name: &str) -> Category {
    Category::insert(
        &state.db,
        &CreateCategoryRequest {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .expect("seed category")
}

pub async fn seed_location(state: &AppState, name: &str) -> Location {
    Location::insert(
        &state.db,
        &CreateLocationRequest {
            name: name.to_string(),
            branch_code: None,
            address: None,
            description: None,
        },
    )
    .await
    .expect("seed location")
}

pub async fn seed_supplier(state: &AppState, name: &str) -> Supplier {
    Supplier::insert(
        &state.db,
        &CreateSupplierRequest {
            name: name.to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
        },
    )
    .await
    .expect("seed supplier")
}

pub async fn seed_item(
    state: &AppState,
    code: &str,
    category_id: i64,
    location_id: i64,
) -> InventoryItem {
    InventoryItem::insert(
        &state.db,
        &CreateInventoryItemRequest {
            item_code: code.to_string(),
            name: format!("Item {}", code),
            description: None,
            category_id,
            location_id,
            condition: ItemCondition::Good,
            quantity: 1,
            purchase_price: 100.0,
            purchase_date: "2024-01-15".to_string(),
        },
    )
    .await
    .expect("seed item")
}

pub async fn seed_user(state: &AppState, username: &str, role: UserRole) -> User {
    let hash = crate::api::auth::hash_password("password123").expect("hash");
    User::insert(&state.db, username, &hash, role)
        .await
        .expect("seed user")
}
