//! End-to-end tests driving the full router over an in-memory database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use assetdesk::config::Config;
use assetdesk::AppState;

async fn app() -> Router {
    let db = assetdesk::db::connect("sqlite::memory:").await.unwrap();
    let config = Config::default();
    assetdesk::api::auth::ensure_admin_user(
        &db,
        &config.auth.admin_username,
        &config.auth.admin_password,
    )
    .await
    .unwrap();
    assetdesk::api::create_router(Arc::new(AppState::new(config, db)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_session() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/locations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    let (status, _) = send(&app, Method::GET, "/api/locations", Some("bogus"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong-pass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["message"], "Invalid credentials");
}

#[tokio::test]
async fn inventory_lifecycle() {
    let app = app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let (status, body) = send(&app, Method::GET, "/api/locations", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = send(&app, Method::GET, "/api/locations/1", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, hq) = send(
        &app,
        Method::POST,
        "/api/locations",
        token,
        Some(json!({ "name": "Head Office", "branch_code": "HQ" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, branch) = send(
        &app,
        Method::POST,
        "/api/locations",
        token,
        Some(json!({ "name": "Branch 2" })),
    )
    .await;
    let (_, category) = send(
        &app,
        Method::POST,
        "/api/categories",
        token,
        Some(json!({ "name": "Laptops" })),
    )
    .await;
    let (_, supplier) = send(
        &app,
        Method::POST,
        "/api/suppliers",
        token,
        Some(json!({ "name": "Acme", "email": "sales@acme.test" })),
    )
    .await;

    let (status, item) = send(
        &app,
        Method::POST,
        "/api/inventory",
        token,
        Some(json!({
            "item_code": "LAP-001",
            "name": "ThinkPad T14",
            "category_id": category["id"],
            "location_id": hq["id"],
            "quantity": 1,
            "purchase_price": 1200.0,
            "purchase_date": "2024-03-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item["condition"], "good");

    let (status, purchase) = send(
        &app,
        Method::POST,
        "/api/purchases",
        token,
        Some(json!({
            "item_id": item["id"],
            "supplier_id": supplier["id"],
            "quantity": 5,
            "unit_price": 25.50,
            "purchase_date": "2024-03-02"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(purchase["total_price"], 127.5);

    let (status, transfer) = send(
        &app,
        Method::POST,
        "/api/transfers",
        token,
        Some(json!({
            "item_id": item["id"],
            "to_location_id": branch["id"],
            "status": "completed"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transfer["transferred_by"], "admin");
    assert_eq!(transfer["from_location_id"], hq["id"]);

    let item_uri = format!("/api/inventory/{}", item["id"]);
    let (_, moved) = send(&app, Method::GET, &item_uri, token, None).await;
    assert_eq!(moved["location_id"], branch["id"]);
    assert_eq!(moved["location_name"], "Branch 2");

    let supplier_uri = format!("/api/suppliers/{}", supplier["id"]);
    let (status, body) = send(&app, Method::DELETE, &supplier_uri, token, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["message"], "Cannot delete supplier: it is in use");

    let (status, cleared) = send(
        &app,
        Method::PUT,
        &supplier_uri,
        token,
        Some(json!({ "email": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["email"].is_null());
    assert_eq!(cleared["name"], "Acme");

    let (status, stats) = send(&app, Method::GET, "/api/dashboard/stats", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_items"], 1);
    assert_eq!(stats["latest_transfers"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/categories/999",
        token,
        Some(json!({ "name": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Category with ID 999 does not exist");
}

#[tokio::test]
async fn batch_import_and_reports() {
    let app = app().await;
    let token = login(&app).await;
    let token = Some(token.as_str());

    let content = "code\tname\tdescription\tcategory\tlocation\tcondition\tquantity\tprice\tdate\n\
                   MON-001\tDell U2720Q\t27 inch\tMonitors\tWarehouse\texcellent\t3\t450\t2024-05-01\n\
                   MON-002\tBroken row\t\tMonitors\tWarehouse\tshiny";
    let (status, result) = send(
        &app,
        Method::POST,
        "/api/inventory/batch-import",
        token,
        Some(json!({ "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["success_count"], 1);
    assert_eq!(result["errors"][0]["line"], 3);
    assert_eq!(result["errors"][0]["item_code"], "MON-002");

    let (_, categories) = send(&app, Method::GET, "/api/categories", token, None).await;
    assert_eq!(categories[0]["name"], "Monitors");

    let (status, report) = send(
        &app,
        Method::GET,
        "/api/reports/inventory?condition=excellent",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report.as_array().unwrap().len(), 1);
    assert_eq!(report[0]["location_name"], "Warehouse");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/reports/purchases/by-month?start_date=not-a-date",
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_ends_session_and_users_are_admin_only() {
    let app = app().await;
    let admin_token = login(&app).await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/users",
        Some(&admin_token),
        Some(json!({ "username": "clerk", "password": "clerkpass1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "user");
    assert!(created.get("password_hash").is_none());

    let (_, session) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "clerk", "password": "clerkpass1" })),
    )
    .await;
    let clerk_token = session["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/users", Some(&clerk_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = send(
        &app,
        Method::GET,
        "/api/auth/validate",
        Some(&clerk_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "clerk");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/logout",
        Some(&clerk_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/auth/validate",
        Some(&clerk_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
