use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Customer whose buildings the organisation cleans.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Client {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateClient {
    pub name: String,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateClient {
    pub name: String,
    pub contact_email: Option<String>,
    pub is_active: bool,
}

impl Client {
    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE organisation_id = $1 ORDER BY name ASC",
        )
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        data: &CreateClient,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"INSERT INTO clients (id, organisation_id, name, contact_email)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(&data.name)
        .bind(&data.contact_email)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateClient,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"UPDATE clients
               SET name = $3, contact_email = $4, is_active = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.name)
        .bind(&data.contact_email)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
