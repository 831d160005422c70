use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_PASS_RATE_THRESHOLD: i64 = 80;

/// Tenant root. Every other row is scoped to one organisation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Organisation {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_path: Option<String>,
    pub pass_rate_threshold: i64, // display only
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateOrganisation {
    pub name: String,
    pub slug: String,
    pub pass_rate_threshold: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateOrganisation {
    pub name: String,
    pub pass_rate_threshold: i64,
}

impl Organisation {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        data: &CreateOrganisation,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let threshold = data
            .pass_rate_threshold
            .unwrap_or(DEFAULT_PASS_RATE_THRESHOLD);
        sqlx::query_as::<_, Organisation>(
            r#"INSERT INTO organisations (id, name, slug, pass_rate_threshold)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.slug)
        .bind(threshold)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateOrganisation,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organisation>(
            r#"UPDATE organisations
               SET name = $2, pass_rate_threshold = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.pass_rate_threshold)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_logo_path(
        pool: &SqlitePool,
        id: Uuid,
        logo_path: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organisation>(
            r#"UPDATE organisations
               SET logo_path = $2, updated_at = datetime('now', 'subsec')
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(logo_path)
        .fetch_optional(pool)
        .await
    }
}
