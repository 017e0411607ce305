//! Dashboard and report aggregation queries.
//!
//! Everything here is read-only and recomputed on every call.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::inventory_item::{InventoryItemDetail, ItemCondition};
use super::transfer::{LocationHistoryDetail, DETAIL_SELECT as TRANSFER_DETAIL_SELECT};

/// Length of the dashboard's recent-activity window
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Per-condition totals
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConditionSummary {
    pub condition: String,
    pub item_count: i64,
    pub total_quantity: i64,
    pub total_value: f64,
}

/// Per-location totals; locations without items report zeros
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationSummary {
    pub location_id: i64,
    pub location_name: String,
    pub branch_code: Option<String>,
    pub item_count: i64,
    pub total_quantity: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupplierPurchaseSummary {
    pub supplier_id: i64,
    pub supplier_name: String,
    pub purchase_count: i64,
    pub total_quantity: i64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlyPurchaseSummary {
    /// `YYYY-MM`
    pub month: String,
    pub purchase_count: i64,
    pub total_quantity: i64,
    pub total_spent: f64,
}

/// Activity inside the trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentActivity {
    pub window_days: i64,
    pub new_items: i64,
    pub purchases: i64,
    pub purchase_spend: f64,
    pub transfers: i64,
    pub completed_transfers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_items: i64,
    pub total_quantity: i64,
    pub total_value: f64,
    pub total_categories: i64,
    pub total_locations: i64,
    pub total_suppliers: i64,
    /// Pending or in-transit transfers
    pub open_transfers: i64,
    pub items_by_condition: Vec<ConditionSummary>,
    pub items_by_location: Vec<LocationSummary>,
    pub recent_activity: RecentActivity,
    pub latest_transfers: Vec<LocationHistoryDetail>,
}

/// Filters for the inventory report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryReportQuery {
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub condition: Option<ItemCondition>,
}

/// Inclusive `YYYY-MM-DD` date range
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferReportQuery {
    pub status: Option<super::transfer::TransferStatus>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

fn date_conditions(
    column: &str,
    start_date: &Option<String>,
    end_date: &Option<String>,
    conditions: &mut Vec<String>,
    bindings: &mut Vec<String>,
) {
    if let Some(start) = start_date {
        conditions.push(format!("{} >= ?", column));
        bindings.push(start.clone());
    }
    if let Some(end) = end_date {
        conditions.push(format!("{} <= ?", column));
        bindings.push(end.clone());
    }
}

async fn count(db: &SqlitePool, sql: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(sql).fetch_one(db).await
}

pub async fn condition_summary(db: &SqlitePool) -> Result<Vec<ConditionSummary>, sqlx::Error> {
    let rows: Vec<ConditionSummary> = sqlx::query_as(
        r#"
        SELECT condition,
               COUNT(*) AS item_count,
               COALESCE(SUM(quantity), 0) AS total_quantity,
               COALESCE(SUM(quantity * purchase_price), 0.0) AS total_value
        FROM inventory_items
        GROUP BY condition
        "#,
    )
    .fetch_all(db)
    .await?;

    // Report every condition, in severity order, even when no item has it
    Ok(ItemCondition::ALL
        .iter()
        .map(|c| {
            rows.iter()
                .find(|r| r.condition == c.as_str())
                .cloned()
                .unwrap_or(ConditionSummary {
                    condition: c.as_str().to_string(),
                    item_count: 0,
                    total_quantity: 0,
                    total_value: 0.0,
                })
        })
        .collect())
}

pub async fn location_summary(db: &SqlitePool) -> Result<Vec<LocationSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT l.id AS location_id,
               l.name AS location_name,
               l.branch_code AS branch_code,
               COUNT(i.id) AS item_count,
               COALESCE(SUM(i.quantity), 0) AS total_quantity,
               COALESCE(SUM(i.quantity * i.purchase_price), 0.0) AS total_value
        FROM locations l
        LEFT JOIN inventory_items i ON i.location_id = l.id
        GROUP BY l.id
        ORDER BY l.name
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn inventory_report(
    db: &SqlitePool,
    query: &InventoryReportQuery,
) -> Result<Vec<InventoryItemDetail>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(category_id) = query.category_id {
        conditions.push("i.category_id = ?".to_string());
        bindings.push(category_id.to_string());
    }
    if let Some(location_id) = query.location_id {
        conditions.push("i.location_id = ?".to_string());
        bindings.push(location_id.to_string());
    }
    if let Some(condition) = query.condition {
        conditions.push("i.condition = ?".to_string());
        bindings.push(condition.as_str().to_string());
    }

    let sql = format!(
        r#"
        SELECT i.*, c.name AS category_name, l.name AS location_name
        FROM inventory_items i
        JOIN categories c ON c.id = i.category_id
        JOIN locations l ON l.id = i.location_id
        {}
        ORDER BY l.name, i.item_code
        "#,
        where_clause(&conditions)
    );

    let mut q = sqlx::query_as::<_, InventoryItemDetail>(&sql);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q.fetch_all(db).await
}

pub async fn purchases_by_supplier(
    db: &SqlitePool,
    range: &DateRangeQuery,
) -> Result<Vec<SupplierPurchaseSummary>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();
    date_conditions(
        "p.purchase_date",
        &range.start_date,
        &range.end_date,
        &mut conditions,
        &mut bindings,
    );

    let sql = format!(
        r#"
        SELECT s.id AS supplier_id,
               s.name AS supplier_name,
               COUNT(*) AS purchase_count,
               COALESCE(SUM(p.quantity), 0) AS total_quantity,
               COALESCE(SUM(p.total_price), 0.0) AS total_spent
        FROM purchases p
        JOIN suppliers s ON s.id = p.supplier_id
        {}
        GROUP BY s.id
        ORDER BY total_spent DESC, s.name
        "#,
        where_clause(&conditions)
    );

    let mut q = sqlx::query_as::<_, SupplierPurchaseSummary>(&sql);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q.fetch_all(db).await
}

pub async fn purchases_by_month(
    db: &SqlitePool,
    range: &DateRangeQuery,
) -> Result<Vec<MonthlyPurchaseSummary>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();
    date_conditions(
        "purchase_date",
        &range.start_date,
        &range.end_date,
        &mut conditions,
        &mut bindings,
    );

    let sql = format!(
        r#"
        SELECT substr(purchase_date, 1, 7) AS month,
               COUNT(*) AS purchase_count,
               COALESCE(SUM(quantity), 0) AS total_quantity,
               COALESCE(SUM(total_price), 0.0) AS total_spent
        FROM purchases
        {}
        GROUP BY month
        ORDER BY month
        "#,
        where_clause(&conditions)
    );

    let mut q = sqlx::query_as::<_, MonthlyPurchaseSummary>(&sql);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q.fetch_all(db).await
}

pub async fn transfer_report(
    db: &SqlitePool,
    query: &TransferReportQuery,
) -> Result<Vec<LocationHistoryDetail>, sqlx::Error> {
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = query.status {
        conditions.push("h.status = ?".to_string());
        bindings.push(status.as_str().to_string());
    }
    date_conditions(
        "h.transfer_date",
        &query.start_date,
        &query.end_date,
        &mut conditions,
        &mut bindings,
    );

    let sql = format!(
        "{} {} ORDER BY h.transfer_date DESC, h.id DESC",
        TRANSFER_DETAIL_SELECT,
        where_clause(&conditions)
    );

    let mut q = sqlx::query_as::<_, LocationHistoryDetail>(&sql);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q.fetch_all(db).await
}

async fn recent_activity(db: &SqlitePool) -> Result<RecentActivity, sqlx::Error> {
    let cutoff = chrono::Utc::now() - chrono::Duration::days(RECENT_WINDOW_DAYS);
    let cutoff_timestamp = cutoff.to_rfc3339();
    let cutoff_date = cutoff.format("%Y-%m-%d").to_string();

    let new_items: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items WHERE created_at >= ?")
            .bind(&cutoff_timestamp)
            .fetch_one(db)
            .await?;

    let (purchases, purchase_spend): (i64, f64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(total_price), 0.0) FROM purchases WHERE purchase_date >= ?",
    )
    .bind(&cutoff_date)
    .fetch_one(db)
    .await?;

    let (transfers, completed_transfers): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0)
        FROM location_history
        WHERE transfer_date >= ?
        "#,
    )
    .bind(&cutoff_date)
    .fetch_one(db)
    .await?;

    Ok(RecentActivity {
        window_days: RECENT_WINDOW_DAYS,
        new_items,
        purchases,
        purchase_spend,
        transfers,
        completed_transfers,
    })
}

pub async fn dashboard_stats(db: &SqlitePool) -> Result<DashboardStats, sqlx::Error> {
    let (total_items, total_quantity, total_value): (i64, i64, f64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(quantity), 0),
               COALESCE(SUM(quantity * purchase_price), 0.0)
        FROM inventory_items
        "#,
    )
    .fetch_one(db)
    .await?;

    let total_categories = count(db, "SELECT COUNT(*) FROM categories").await?;
    let total_locations = count(db, "SELECT COUNT(*) FROM locations").await?;
    let total_suppliers = count(db, "SELECT COUNT(*) FROM suppliers").await?;
    let open_transfers = count(
        db,
        "SELECT COUNT(*) FROM location_history WHERE status IN ('pending', 'in_transit')",
    )
    .await?;

    let latest_sql = format!("{} ORDER BY h.id DESC LIMIT 5", TRANSFER_DETAIL_SELECT);
    let latest_transfers = sqlx::query_as::<_, LocationHistoryDetail>(&latest_sql)
        .fetch_all(db)
        .await?;

    Ok(DashboardStats {
        total_items,
        total_quantity,
        total_value,
        total_categories,
        total_locations,
        total_suppliers,
        open_transfers,
        items_by_condition: condition_summary(db).await?,
        items_by_location: location_summary(db).await?,
        recent_activity: recent_activity(db).await?,
        latest_transfers,
    })
}
