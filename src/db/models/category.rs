//! Category models and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
}

impl Category {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM categories ORDER BY id")
            .fetch_all(db)
            .await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_name(
        db: &SqlitePool,
        name: &str,
    ) -> Result<Option<Category>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM categories WHERE name = ? COLLATE NOCASE LIMIT 1")
            .bind(name)
            .fetch_optional(db)
            .await
    }

    pub async fn exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert(
        db: &SqlitePool,
        req: &CreateCategoryRequest,
    ) -> Result<Category, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM categories WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateCategoryRequest,
    ) -> Result<Option<Category>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = COALESCE(?, name),
                description = CASE WHEN ? THEN ? ELSE description END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
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

    pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
