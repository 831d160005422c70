use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// `draft -> active -> closed`, and `draft | active -> cancelled`.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "activity_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Draft,
    Active,
    Closed,
    Cancelled,
}

impl ActivityStatus {
    /// Room tasks may still be (re)assigned.
    pub fn is_open(self) -> bool {
        matches!(self, ActivityStatus::Draft | ActivityStatus::Active)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct CleaningActivity {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub floor_id: Uuid,
    pub name: String,
    pub scheduled_date: NaiveDate,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    pub notes: Option<String>,
    pub status: ActivityStatus,
    pub created_by: Option<Uuid>,
    pub published_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Activity with its location and task progress, for list views.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivitySummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub activity: CleaningActivity,
    pub floor_name: String,
    pub building_id: Uuid,
    pub building_name: String,
    pub client_id: Uuid,
    pub total_tasks: i64,
    pub assigned_tasks: i64,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCleaningActivity {
    pub floor_id: Uuid,
    pub name: String,
    pub scheduled_date: NaiveDate,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    pub notes: Option<String>,
    pub template_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateCleaningActivity {
    pub name: String,
    pub scheduled_date: NaiveDate,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    pub notes: Option<String>,
}

const SUMMARY_SELECT: &str = r#"SELECT
    a.*,
    f.name        AS floor_name,
    b.id          AS building_id,
    b.name        AS building_name,
    b.client_id   AS client_id,
    (SELECT COUNT(*) FROM room_tasks t WHERE t.activity_id = a.id) AS total_tasks,
    (SELECT COUNT(*) FROM room_tasks t WHERE t.activity_id = a.id AND t.assigned_to IS NOT NULL) AS assigned_tasks,
    (SELECT COUNT(*) FROM room_tasks t WHERE t.activity_id = a.id
        AND t.status IN ('done', 'inspected_pass', 'inspected_fail')) AS completed_tasks
FROM cleaning_activities a
JOIN floors f ON f.id = a.floor_id
JOIN buildings b ON b.id = f.building_id"#;

impl CleaningActivity {
    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CleaningActivity>(
            "SELECT * FROM cleaning_activities WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_summary(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<ActivitySummary>, sqlx::Error> {
        let sql = format!("{SUMMARY_SELECT} WHERE a.id = $1 AND a.organisation_id = $2");
        sqlx::query_as::<_, ActivitySummary>(&sql)
            .bind(id)
            .bind(organisation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_summaries(
        pool: &SqlitePool,
        organisation_id: Uuid,
        status: Option<ActivityStatus>,
        client_id: Option<Uuid>,
    ) -> Result<Vec<ActivitySummary>, sqlx::Error> {
        let sql = format!(
            r#"{SUMMARY_SELECT}
               WHERE a.organisation_id = $1
                 AND ($2 IS NULL OR a.status = $2)
                 AND ($3 IS NULL OR b.client_id = $3)
               ORDER BY a.scheduled_date DESC, a.created_at DESC"#
        );
        sqlx::query_as::<_, ActivitySummary>(&sql)
            .bind(organisation_id)
            .bind(status)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        data: &CreateCleaningActivity,
        created_by: Uuid,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, CleaningActivity>(
            r#"INSERT INTO cleaning_activities
                   (id, organisation_id, floor_id, name, scheduled_date, window_start, window_end, notes, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(data.floor_id)
        .bind(&data.name)
        .bind(data.scheduled_date)
        .bind(data.window_start)
        .bind(data.window_end)
        .bind(&data.notes)
        .bind(created_by)
        .fetch_one(executor)
        .await
    }

    /// Edits a draft activity. `None` when missing or no longer draft.
    pub async fn update_draft(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateCleaningActivity,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CleaningActivity>(
            r#"UPDATE cleaning_activities
               SET name = $3, scheduled_date = $4, window_start = $5, window_end = $6, notes = $7,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'draft'
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.name)
        .bind(data.scheduled_date)
        .bind(data.window_start)
        .bind(data.window_end)
        .bind(&data.notes)
        .fetch_optional(pool)
        .await
    }

    /// `draft -> active`. Returns rows affected; zero means the status precondition failed.
    pub async fn publish(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE cleaning_activities
               SET status = 'active', published_at = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'draft'"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// `active -> closed`.
    pub async fn close(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE cleaning_activities
               SET status = 'closed', closed_at = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'active'"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// `draft | active -> cancelled`.
    pub async fn cancel(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE cleaning_activities
               SET status = 'cancelled', cancelled_at = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status IN ('draft', 'active')"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_draft(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM cleaning_activities WHERE id = $1 AND organisation_id = $2 AND status = 'draft'",
        )
        .bind(id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
