use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Supervisor,
    Janitor,
    Client,
}

impl Role {
    /// Path segment used by the role's routes (`/{org}/{segment}/...`).
    pub fn segment(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Janitor => "janitor",
            Role::Client => "client",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub client_id: Option<Uuid>, // set for client users only
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub client_id: Option<Uuid>,
}

impl User {
    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        organisation_id: Uuid,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE organisation_id = $1 AND email = $2 COLLATE NOCASE",
        )
        .bind(organisation_id)
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
        role: Option<Role>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT * FROM users
               WHERE organisation_id = $1 AND ($2 IS NULL OR role = $2)
               ORDER BY full_name ASC"#,
        )
        .bind(organisation_id)
        .bind(role)
        .fetch_all(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        data: &CreateUser,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, organisation_id, email, full_name, role, client_id)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.email)
        .bind(&data.full_name)
        .bind(data.role)
        .bind(data.client_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update_role(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        role: Role,
        client_id: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET role = $3, client_id = $4, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(role)
        .bind(client_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_active(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"UPDATE users
               SET is_active = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
    }

    /// Active janitor in the organisation, if any.
    pub async fn find_active_janitor(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"SELECT * FROM users
               WHERE id = $1 AND organisation_id = $2 AND role = 'janitor' AND is_active = 1"#,
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }
}
