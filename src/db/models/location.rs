//! Location models and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    /// Short branch identifier, e.g. "HQ" or "BR-02"
    pub branch_code: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub branch_code: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub branch_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
}

impl Location {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Location>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM locations ORDER BY id")
            .fetch_all(db)
            .await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Case-insensitive lookup used by batch import
    pub async fn find_by_name(
        db: &SqlitePool,
        name: &str,
    ) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM locations WHERE name = ? COLLATE NOCASE LIMIT 1")
            .bind(name)
            .fetch_optional(db)
            .await
    }

    pub async fn exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert(
        db: &SqlitePool,
        req: &CreateLocationRequest,
    ) -> Result<Location, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO locations (name, branch_code, address, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(&req.branch_code)
        .bind(&req.address)
        .bind(&req.description)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM locations WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }

    /// Apply a partial update. Returns `None` when no row has this id.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateLocationRequest,
    ) -> Result<Option<Location>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE locations SET
                name = COALESCE(?, name),
                branch_code = CASE WHEN ? THEN ? ELSE branch_code END,
                address = CASE WHEN ? THEN ? ELSE address END,
                description = CASE WHEN ? THEN ? ELSE description END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(req.branch_code.is_some())
        .bind(req.branch_code.clone().flatten())
        .bind(req.address.is_some())
        .bind(req.address.clone().flatten())
        .bind(req.description.is_some())
        .bind(req.description.clone().flatten())
        .bind(&now)
        .bind(id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find(db, id).await
    }

    /// Returns `false` when no row has this id.
    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
