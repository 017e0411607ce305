//! Purchase models and queries.
//!
//! `total_price` is never accepted from callers; it is derived from
//! quantity and unit price on every write.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub item_id: i64,
    pub supplier_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
    pub purchase_date: String,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Purchase joined with item and supplier names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub purchase: Purchase,
    pub item_code: String,
    pub item_name: String,
    pub supplier_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePurchaseRequest {
    pub item_id: i64,
    pub supplier_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub purchase_date: String,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub item_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub purchase_date: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub invoice_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

const DETAIL_SELECT: &str = r#"
    SELECT p.*, i.item_code AS item_code, i.name AS item_name, s.name AS supplier_name
    FROM purchases p
    JOIN inventory_items i ON i.id = p.item_id
    JOIN suppliers s ON s.id = p.supplier_id
"#;

impl Purchase {
    pub fn total_price(quantity: i64, unit_price: f64) -> f64 {
        quantity as f64 * unit_price
    }

    pub async fn list(db: &SqlitePool) -> Result<Vec<PurchaseDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY p.id", DETAIL_SELECT);
        sqlx::query_as(&sql).fetch_all(db).await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Purchase>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM purchases WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_detail(
        db: &SqlitePool,
        id: i64,
    ) -> Result<Option<PurchaseDetail>, sqlx::Error> {
        let sql = format!("{} WHERE p.id = ?", DETAIL_SELECT);
        sqlx::query_as(&sql).bind(id).fetch_optional(db).await
    }

    pub async fn insert(
        db: &SqlitePool,
        req: &CreatePurchaseRequest,
    ) -> Result<Purchase, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let total_price = Self::total_price(req.quantity, req.unit_price);

        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                item_id, supplier_id, quantity, unit_price, total_price,
                purchase_date, invoice_number, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.item_id)
        .bind(req.supplier_id)
        .bind(req.quantity)
        .bind(req.unit_price)
        .bind(total_price)
        .bind(&req.purchase_date)
        .bind(&req.invoice_number)
        .bind(&req.notes)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM purchases WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }

    /// Partial update. The total is recomputed from the merged quantity and
    /// unit price whether or not either was supplied.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdatePurchaseRequest,
    ) -> Result<Option<Purchase>, sqlx::Error> {
        let existing = match Self::find(db, id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let quantity = req.quantity.unwrap_or(existing.quantity);
        let unit_price = req.unit_price.unwrap_or(existing.unit_price);
        let total_price = Self::total_price(quantity, unit_price);
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE purchases SET
                item_id = COALESCE(?, item_id),
                supplier_id = COALESCE(?, supplier_id),
                quantity = ?,
                unit_price = ?,
                total_price = ?,
                purchase_date = COALESCE(?, purchase_date),
                invoice_number = CASE WHEN ? THEN ? ELSE invoice_number END,
                notes = CASE WHEN ? THEN ? ELSE notes END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.item_id)
        .bind(req.supplier_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(total_price)
        .bind(&req.purchase_date)
        .bind(req.invoice_number.is_some())
        .bind(req.invoice_number.clone().flatten())
        .bind(req.notes.is_some())
        .bind(req.notes.clone().flatten())
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find(db, id).await
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
