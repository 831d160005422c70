use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A janitor's answer to one checklist item of a room task.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TaskItemResponse {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub room_task_id: Uuid,
    pub checklist_item_id: Uuid,
    pub completed: bool,
    pub photo_path: Option<String>,
    pub note: Option<String>,
    pub responded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpsertTaskItemResponse {
    pub checklist_item_id: Uuid,
    pub completed: bool,
    pub note: Option<String>,
}

impl TaskItemResponse {
    pub async fn find_by_task(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskItemResponse>(
            r#"SELECT * FROM task_item_responses
               WHERE room_task_id = $1 AND organisation_id = $2"#,
        )
        .bind(room_task_id)
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    /// Insert or update the response for one item. An existing photo is kept.
    pub async fn upsert(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_task_id: Uuid,
        data: &UpsertTaskItemResponse,
        responded_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskItemResponse>(
            r#"INSERT INTO task_item_responses
                   (id, organisation_id, room_task_id, checklist_item_id, completed, note, responded_by)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT(room_task_id, checklist_item_id) DO UPDATE SET
                   completed = excluded.completed,
                   note = excluded.note,
                   responded_by = excluded.responded_by,
                   updated_at = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(room_task_id)
        .bind(data.checklist_item_id)
        .bind(data.completed)
        .bind(&data.note)
        .bind(responded_by)
        .fetch_one(pool)
        .await
    }

    /// Attach a photo, creating an incomplete response when none exists yet.
    pub async fn set_photo(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_task_id: Uuid,
        checklist_item_id: Uuid,
        photo_path: &str,
        responded_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskItemResponse>(
            r#"INSERT INTO task_item_responses
                   (id, organisation_id, room_task_id, checklist_item_id, completed, photo_path, responded_by)
               VALUES ($1, $2, $3, $4, 0, $5, $6)
               ON CONFLICT(room_task_id, checklist_item_id) DO UPDATE SET
                   photo_path = excluded.photo_path,
                   responded_by = excluded.responded_by,
                   updated_at = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(room_task_id)
        .bind(checklist_item_id)
        .bind(photo_path)
        .bind(responded_by)
        .fetch_one(pool)
        .await
    }
}
