use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::user::Role;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Invitation {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub client_id: Option<Uuid>,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub token: String,
    pub invited_by: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateInvitation {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub client_id: Option<Uuid>,
}

impl Invitation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        data: &CreateInvitation,
        token: &str,
        invited_by: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"INSERT INTO invitations
                   (id, organisation_id, email, full_name, role, client_id, token, invited_by, expires_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(&data.email)
        .bind(&data.full_name)
        .bind(data.role)
        .bind(data.client_id)
        .bind(token)
        .bind(invited_by)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_token(pool: &SqlitePool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE token = $1")
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_pending(
        pool: &SqlitePool,
        organisation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invitation>(
            r#"SELECT * FROM invitations
               WHERE organisation_id = $1 AND accepted_at IS NULL
               ORDER BY created_at DESC"#,
        )
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    /// Marks the invitation accepted unless it already was. Returns rows affected.
    pub async fn mark_accepted<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE invitations SET accepted_at = $2 WHERE id = $1 AND accepted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM invitations WHERE id = $1 AND organisation_id = $2 AND accepted_at IS NULL",
        )
        .bind(id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
