//! Supplier models and queries.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSupplierRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::nullable")]
    pub address: Option<Option<String>>,
}

impl Supplier {
    pub async fn list(db: &SqlitePool) -> Result<Vec<Supplier>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM suppliers ORDER BY id")
            .fetch_all(db)
            .await
    }

    pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Supplier>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM suppliers WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM suppliers WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert(
        db: &SqlitePool,
        req: &CreateSupplierRequest,
    ) -> Result<Supplier, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (name, contact_person, email, phone, address, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&req.name)
        .bind(&req.contact_person)
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

        sqlx::query_as("SELECT * FROM suppliers WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db)
            .await
    }

    pub async fn update(
        db: &SqlitePool,
        id: i64,
        req: &UpdateSupplierRequest,
    ) -> Result<Option<Supplier>, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = COALESCE(?, name),
                contact_person = CASE WHEN ? THEN ? ELSE contact_person END,
                email = CASE WHEN ? THEN ? ELSE email END,
                phone = CASE WHEN ? THEN ? ELSE phone END,
                address = CASE WHEN ? THEN ? ELSE address END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&req.name)
        .bind(req.contact_person.is_some())
        .bind(req.contact_person.clone().flatten())
        .bind(req.email.is_some())
        .bind(req.email.clone().flatten())
        .bind(req.phone.is_some())
        .bind(req.phone.clone().flatten())
        .bind(req.address.is_some())
        .bind(req.address.clone().flatten())
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
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
