use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Per-user inbox row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Notification {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
        title: &str,
        body: &str,
        link: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"INSERT INTO notifications (id, organisation_id, user_id, title, body, link)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(user_id)
        .bind(title)
        .bind(body)
        .bind(link)
        .fetch_one(pool)
        .await
    }

    pub async fn find_for_user(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"SELECT * FROM notifications
               WHERE user_id = $1 AND organisation_id = $2 AND ($3 = 0 OR is_read = 0)
               ORDER BY created_at DESC
               LIMIT $4"#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn count_unread(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM notifications
               WHERE user_id = $1 AND organisation_id = $2 AND is_read = 0"#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .fetch_one(pool)
        .await
    }

    pub async fn mark_read(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE notifications SET is_read = 1
               WHERE id = $1 AND user_id = $2 AND organisation_id = $3"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_all_read(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE notifications SET is_read = 1
               WHERE user_id = $1 AND organisation_id = $2 AND is_read = 0"#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
