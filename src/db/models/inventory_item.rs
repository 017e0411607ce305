//! Inventory item models and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

/// Physical state of an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Damaged,
}

impl ItemCondition {
    pub const ALL: [ItemCondition; 5] = [
        ItemCondition::Excellent,
        ItemCondition::Good,
        ItemCondition::Fair,
        ItemCondition::Poor,
        ItemCondition::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::Excellent => "excellent",
            ItemCondition::Good => "good",
            ItemCondition::Fair => "fair",
            ItemCondition::Poor => "poor",
            ItemCondition::Damaged => "damaged",
        }
    }
}

impl std::fmt::Display for ItemCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Ok(ItemCondition::Excellent),
            "good" => Ok(ItemCondition::Good),
            "fair" => Ok(ItemCondition::Fair),
            "poor" => Ok(ItemCondition::Poor),
            "damaged" => Ok(ItemCondition::Damaged),
            _ => Err(format!("Unknown condition: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub item_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub location_id: i64,
    pub condition: String,
    pub quantity: i64,
    pub purchase_price: f64,
    pub purchase_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Item joined with its category and location names for list/detail views
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryItemDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub item: InventoryItem,
    pub category_name: String,
    pub location_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInventoryItemRequest {
    pub item_code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub location_id: i64,
    #[serde(default)]
    pub condition: ItemCondition,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub purchase_price: f64,
    pub purchase_date: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInventoryItemRequest {
    pub item_code: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub condition: Option<ItemCondition>,
    pub quantity: Option<i64>,
    pub purchase_price: Option<f64>,
    pub purchase_date: Option<String>,
}

const DETAIL_SELECT: &str = r#"
    SELECT i.*, c.name AS category_name, l.name AS location_name
    FROM inventory_items i
    JOIN categories c ON c.id = i.category_id
    JOIN locations l ON l.id = i.location_id
"#;

impl InventoryItem {
    pub async fn list(db: &SqlitePool) -> Result<Vec<InventoryItemDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY i.id", DETAIL_SELECT);
        sqlx::query_as(&sql).fetch_all(db).await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<InventoryItem>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_detail(
        db: &SqlitePool,
        id: i64,
    ) -> Result<Option<InventoryItemDetail>, sqlx::Error> {
        let sql = format!("{} WHERE i.id = ?", DETAIL_SELECT);
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn code_taken(
        db: &SqlitePool,
        item_code: &str,
        except_id: Option<i64>,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM inventory_items WHERE item_code = ? AND id != COALESCE(?, -1)",
        )
        .bind(item_code)
        .bind(except_id)
        .fetch_optional(db)
        .await?;
        Ok(row.is_some())
    }

    pub async fn insert(
        db: &SqlitePool,
        req: &CreateInventoryItemRequest,
    ) -> Result<InventoryItem, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items (
                item_code, name, description, category_id, location_id, condition,
                quantity, purchase_price, purchase_date, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.item_code)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.category_id)
        .bind(req.location_id)
        .bind(req.condition.as_str())
        .bind(req.quantity)
        .bind(req.purchase_price)
        .bind(&req.purchase_date)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM inventory_items WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateInventoryItemRequest,
    ) -> Result<Option<InventoryItem>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE inventory_items SET
                item_code = COALESCE(?, item_code),
                name = COALESCE(?, name),
                description = CASE WHEN ? THEN ? ELSE description END,
                category_id = COALESCE(?, category_id),
                location_id = COALESCE(?, location_id),
                condition = COALESCE(?, condition),
                quantity = COALESCE(?, quantity),
                purchase_price = COALESCE(?, purchase_price),
                purchase_date = COALESCE(?, purchase_date),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.item_code)
        .bind(&req.name)
        .bind(req.description.is_some())
        .bind(req.description.clone().flatten())
        .bind(req.category_id)
        .bind(req.location_id)
        .bind(req.condition.map(|c| c.as_str()))
        .bind(req.quantity)
        .bind(req.purchase_price)
        .bind(&req.purchase_date)
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find(db, id).await
    }

    /// Point an item at a new location. Runs on the caller's connection so a
    /// transfer write and the move commit together.
    pub async fn move_to_location(
        conn: &mut SqliteConnection,
        id: i64,
        location_id: i64,
    ) -> Result<(), sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("UPDATE inventory_items SET location_id = ?, updated_at = ? WHERE id = ?")
            .bind(location_id)
            .bind(&now)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
