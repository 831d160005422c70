use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "deficiency_severity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeficiencySeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "deficiency_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeficiencyStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Deficiency {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub room_task_id: Uuid,
    pub description: String,
    pub severity: DeficiencySeverity,
    pub status: DeficiencyStatus,
    pub assigned_to: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateDeficiency {
    pub room_task_id: Uuid,
    pub description: String,
    #[serde(default)]
    pub severity: DeficiencySeverity,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ResolveDeficiency {
    pub resolution_note: Option<String>,
}

impl Deficiency {
    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            "SELECT * FROM deficiencies WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
        status: Option<DeficiencyStatus>,
        assigned_to: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            r#"SELECT * FROM deficiencies
               WHERE organisation_id = $1
                 AND ($2 IS NULL OR status = $2)
                 AND ($3 IS NULL OR assigned_to = $3)
               ORDER BY created_at DESC"#,
        )
        .bind(organisation_id)
        .bind(status)
        .bind(assigned_to)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_room_task(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            r#"SELECT * FROM deficiencies
               WHERE room_task_id = $1 AND organisation_id = $2
               ORDER BY created_at ASC"#,
        )
        .bind(room_task_id)
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_open_for_activity(
        pool: &SqlitePool,
        organisation_id: Uuid,
        activity_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM deficiencies d
               JOIN room_tasks t ON t.id = d.room_task_id
               WHERE t.activity_id = $1 AND d.organisation_id = $2 AND d.status != 'resolved'"#,
        )
        .bind(activity_id)
        .bind(organisation_id)
        .fetch_one(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        data: &CreateDeficiency,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Deficiency>(
            r#"INSERT INTO deficiencies
                   (id, organisation_id, room_task_id, description, severity, assigned_to, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(data.room_task_id)
        .bind(&data.description)
        .bind(data.severity)
        .bind(data.assigned_to)
        .bind(created_by)
        .fetch_one(executor)
        .await
    }

    /// Assigns an unresolved deficiency.
    pub async fn assign(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        assigned_to: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            r#"UPDATE deficiencies
               SET assigned_to = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status != 'resolved'
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(assigned_to)
        .fetch_optional(pool)
        .await
    }

    /// `open -> in_progress`.
    pub async fn start(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            r#"UPDATE deficiencies
               SET status = 'in_progress', updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'open'
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    /// `open | in_progress -> resolved`. `None` when already resolved or missing.
    pub async fn resolve(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        resolved_by: Uuid,
        resolution_note: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Deficiency>(
            r#"UPDATE deficiencies
               SET status = 'resolved', resolved_by = $3, resolved_at = $4, resolution_note = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status IN ('open', 'in_progress')
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(resolved_by)
        .bind(Utc::now())
        .bind(resolution_note)
        .fetch_optional(pool)
        .await
    }
}
