use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

use super::room_task::RoomAssignment;

/// Reusable floor + schedule window + default room assignments.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ActivityTemplate {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub floor_id: Uuid,
    pub name: String,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    #[ts(type = "Array<RoomAssignment>")]
    pub default_assignments: Json<Vec<RoomAssignment>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateActivityTemplate {
    pub name: String,
    pub floor_id: Uuid,
    pub window_start: Option<NaiveTime>,
    pub window_end: Option<NaiveTime>,
    #[serde(default)]
    pub default_assignments: Vec<RoomAssignment>,
}

impl ActivityTemplate {
    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
        floor_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityTemplate>(
            r#"SELECT * FROM activity_templates
               WHERE organisation_id = $1 AND ($2 IS NULL OR floor_id = $2)
               ORDER BY name ASC"#,
        )
        .bind(organisation_id)
        .bind(floor_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ActivityTemplate>(
            "SELECT * FROM activity_templates WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        data: &CreateActivityTemplate,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ActivityTemplate>(
            r#"INSERT INTO activity_templates
                   (id, organisation_id, floor_id, name, window_start, window_end, default_assignments, created_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(data.floor_id)
        .bind(&data.name)
        .bind(data.window_start)
        .bind(data.window_end)
        .bind(Json(&data.default_assignments))
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM activity_templates WHERE id = $1 AND organisation_id = $2")
                .bind(id)
                .bind(organisation_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
