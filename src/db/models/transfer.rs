//! Location history (transfer) models and queries.
//!
//! Writing a transfer with status `completed` moves the referenced item to
//! the transfer's destination in the same transaction. Status values are not
//! ordered: any status may be written over any other.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::inventory_item::InventoryItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    #[default]
    Pending,
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::InTransit => "in_transit",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransferStatus::Pending),
            "in_transit" | "in-transit" => Ok(TransferStatus::InTransit),
            "completed" => Ok(TransferStatus::Completed),
            "cancelled" | "canceled" => Ok(TransferStatus::Cancelled),
            _ => Err(format!("Unknown transfer status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LocationHistory {
    pub id: i64,
    pub item_id: i64,
    pub from_location_id: Option<i64>,
    pub to_location_id: i64,
    pub transfer_date: String,
    pub transferred_by: String,
    pub reason: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl LocationHistory {
    pub fn status_enum(&self) -> TransferStatus {
        self.status.parse().unwrap_or_default()
    }
}

/// Transfer joined with item and location names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationHistoryDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub transfer: LocationHistory,
    pub item_code: String,
    pub item_name: String,
    pub from_location_name: Option<String>,
    pub to_location_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransferRequest {
    pub item_id: i64,
    /// Defaults to the item's current location
    pub from_location_id: Option<i64>,
    pub to_location_id: i64,
    /// Defaults to now
    pub transfer_date: Option<String>,
    /// Defaults to the authenticated username
    pub transferred_by: Option<String>,
    pub reason: Option<String>,
    #[serde(default)]
    pub status: TransferStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransferRequest {
    #[serde(default, deserialize_with = "super::nullable")]
    pub from_location_id: Option<Option<i64>>,
    pub to_location_id: Option<i64>,
    pub transfer_date: Option<String>,
    pub transferred_by: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub reason: Option<Option<String>>,
    pub status: Option<TransferStatus>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub notes: Option<Option<String>>,
}

impl UpdateTransferRequest {
    /// Whether applying this update leaves a completed transfer whose item must
    /// follow it: the status was just written, or a completed transfer was
    /// re-pointed at another destination.
    pub fn moves_item(&self, status_after: TransferStatus) -> bool {
        status_after == TransferStatus::Completed
            && (self.status.is_some() || self.to_location_id.is_some())
    }
}

/// A transfer with every default resolved, ready to insert
#[derive(Debug, Clone)]
pub struct NewLocationHistory {
    pub item_id: i64,
    pub from_location_id: Option<i64>,
    pub to_location_id: i64,
    pub transfer_date: String,
    pub transferred_by: String,
    pub reason: Option<String>,
    pub status: TransferStatus,
    pub notes: Option<String>,
}

pub(crate) const DETAIL_SELECT: &str = r#"
    SELECT h.*, i.item_code AS item_code, i.name AS item_name,
           fl.name AS from_location_name, tl.name AS to_location_name
    FROM location_history h
    JOIN inventory_items i ON i.id = h.item_id
    LEFT JOIN locations fl ON fl.id = h.from_location_id
    JOIN locations tl ON tl.id = h.to_location_id
"#;

impl LocationHistory {
    pub async fn list(db: &SqlitePool) -> Result<Vec<LocationHistoryDetail>, sqlx::Error> {
        let sql = format!("{} ORDER BY h.id", DETAIL_SELECT);
        sqlx::query_as(&sql).fetch_all(db).await
    }

    pub async fn list_for_item(
        db: &SqlitePool,
        item_id: i64,
    ) -> Result<Vec<LocationHistoryDetail>, sqlx::Error> {
        let sql = format!("{} WHERE h.item_id = ? ORDER BY h.id", DETAIL_SELECT);
        sqlx::query_as(&sql).bind(item_id).fetch_all(db).await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<LocationHistory>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM location_history WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_detail(
        db: &SqlitePool,
        id: i64,
    ) -> Result<Option<LocationHistoryDetail>, sqlx::Error> {
        let sql = format!("{} WHERE h.id = ?", DETAIL_SELECT);
        sqlx::query_as(&sql).bind(id).fetch_optional(db).await
    }

    async fn find_on(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> Result<Option<LocationHistory>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM location_history WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Insert a transfer; a completed one also moves the item.
    pub async fn insert(
        db: &SqlitePool,
        new: &NewLocationHistory,
    ) -> Result<LocationHistory, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO location_history (
                item_id, from_location_id, to_location_id, transfer_date, transferred_by,
                reason, status, notes, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.item_id)
        .bind(new.from_location_id)
        .bind(new.to_location_id)
        .bind(&new.transfer_date)
        .bind(&new.transferred_by)
        .bind(&new.reason)
        .bind(new.status.as_str())
        .bind(&new.notes)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if new.status == TransferStatus::Completed {
            InventoryItem::move_to_location(&mut tx, new.item_id, new.to_location_id).await?;
        }

        let row = Self::find_on(&mut tx, result.last_insert_rowid())
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;
        tx.commit().await?;
        Ok(row)
    }

    /// Partial update. When the row is `completed` afterwards and the update
    /// wrote its status or destination, the item is moved to that destination.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateTransferRequest,
    ) -> Result<Option<LocationHistory>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = db.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE location_history SET
                from_location_id = CASE WHEN ? THEN ? ELSE from_location_id END,
                to_location_id = COALESCE(?, to_location_id),
                transfer_date = COALESCE(?, transfer_date),
                transferred_by = COALESCE(?, transferred_by),
                reason = CASE WHEN ? THEN ? ELSE reason END,
                status = COALESCE(?, status),
                notes = CASE WHEN ? THEN ? ELSE notes END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.from_location_id.is_some())
        .bind(req.from_location_id.flatten())
        .bind(req.to_location_id)
        .bind(&req.transfer_date)
        .bind(&req.transferred_by)
        .bind(req.reason.is_some())
        .bind(req.reason.clone().flatten())
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.notes.is_some())
        .bind(req.notes.clone().flatten())
        .bind(&now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let row = Self::find_on(&mut tx, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        if req.moves_item(row.status_enum()) {
            InventoryItem::move_to_location(&mut tx, row.item_id, row.to_location_id).await?;
        }

        tx.commit().await?;
        Ok(Some(row))
    }

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM location_history WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::InTransit,
            TransferStatus::Completed,
            TransferStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<TransferStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_moves_item_only_when_completed_and_relevant() {
        let status_only = UpdateTransferRequest {
            status: Some(TransferStatus::Completed),
            ..Default::default()
        };
        assert!(status_only.moves_item(TransferStatus::Completed));

        let repoint = UpdateTransferRequest {
            to_location_id: Some(3),
            ..Default::default()
        };
        assert!(repoint.moves_item(TransferStatus::Completed));
        assert!(!repoint.moves_item(TransferStatus::Pending));

        let notes_only = UpdateTransferRequest {
            notes: Some(Some("checked".to_string())),
            ..Default::default()
        };
        assert!(!notes_only.moves_item(TransferStatus::Completed));
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&TransferStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        assert!(serde_json::from_str::<TransferStatus>("\"shipped\"").is_err());
    }
}
