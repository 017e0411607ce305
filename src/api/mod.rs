pub mod auth;
mod categories;
mod dashboard;
pub mod error;
mod inventory;
mod locations;
mod purchases;
mod reports;
mod suppliers;
mod transfers;
mod users;
mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let public_auth_routes = Router::new().route("/login", post(auth::login));

    // Protected API routes
    let api_routes = Router::new()
        // Session
        .route("/auth/logout", post(auth::logout))
        .route("/auth/validate", get(auth::validate))
        // Locations
        .route(
            "/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/locations/:id",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        // Categories
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        // Suppliers
        .route(
            "/suppliers",
            get(suppliers::list_suppliers).post(suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            get(suppliers::get_supplier)
                .put(suppliers::update_supplier)
                .delete(suppliers::delete_supplier),
        )
        // Inventory
        .route(
            "/inventory",
            get(inventory::list_items).post(inventory::create_item),
        )
        .route("/inventory/batch-import", post(inventory::batch_import))
        .route(
            "/inventory/:id",
            get(inventory::get_item)
                .put(inventory::update_item)
                .delete(inventory::delete_item),
        )
        .route("/inventory/:id/history", get(inventory::get_item_history))
        // Purchases
        .route(
            "/purchases",
            get(purchases::list_purchases).post(purchases::create_purchase),
        )
        .route(
            "/purchases/:id",
            get(purchases::get_purchase)
                .put(purchases::update_purchase)
                .delete(purchases::delete_purchase),
        )
        // Transfers
        .route(
            "/transfers",
            get(transfers::list_transfers).post(transfers::create_transfer),
        )
        .route(
            "/transfers/:id",
            get(transfers::get_transfer)
                .put(transfers::update_transfer)
                .delete(transfers::delete_transfer),
        )
        // Dashboard and reports
        .route("/dashboard/stats", get(dashboard::get_stats))
        .route("/reports/inventory", get(reports::inventory_report))
        .route(
            "/reports/purchases/by-supplier",
            get(reports::purchases_by_supplier),
        )
        .route("/reports/purchases/by-month", get(reports::purchases_by_month))
        .route("/reports/transfers", get(reports::transfer_report))
        .route("/reports/conditions", get(reports::condition_summary))
        .route("/reports/locations", get(reports::location_summary))
        // Users (admin only)
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Protected by auth
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", public_auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
