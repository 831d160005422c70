use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Room {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub floor_id: Uuid,
    pub room_type_id: Option<Uuid>,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateRoom {
    pub floor_id: Uuid,
    pub room_type_id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateRoom {
    pub room_type_id: Option<Uuid>,
    pub name: String,
    pub is_active: bool,
}

impl Room {
    pub async fn find_by_floor(
        pool: &SqlitePool,
        organisation_id: Uuid,
        floor_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"SELECT * FROM rooms
               WHERE floor_id = $1 AND organisation_id = $2
               ORDER BY name ASC"#,
        )
        .bind(floor_id)
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    /// Active rooms on a floor; these get a room task when an activity is created.
    pub async fn find_active_by_floor<'e, E>(
        executor: E,
        organisation_id: Uuid,
        floor_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Room>(
            r#"SELECT * FROM rooms
               WHERE floor_id = $1 AND organisation_id = $2 AND is_active = 1
               ORDER BY name ASC"#,
        )
        .bind(floor_id)
        .bind(organisation_id)
        .fetch_all(executor)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        data: &CreateRoom,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"INSERT INTO rooms (id, organisation_id, floor_id, room_type_id, name)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(data.floor_id)
        .bind(data.room_type_id)
        .bind(&data.name)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateRoom,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            r#"UPDATE rooms
               SET room_type_id = $3, name = $4, is_active = $5,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(data.room_type_id)
        .bind(&data.name)
        .bind(data.is_active)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
