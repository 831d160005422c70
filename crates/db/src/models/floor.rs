use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Floor {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub building_id: Uuid,
    pub name: String,
    pub level: i64,
    pub floor_plan_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFloor {
    pub name: String,
    pub level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateFloor {
    pub name: String,
    pub level: i64,
}

impl Floor {
    pub async fn find_by_building(
        pool: &SqlitePool,
        organisation_id: Uuid,
        building_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Floor>(
            r#"SELECT * FROM floors
               WHERE building_id = $1 AND organisation_id = $2
               ORDER BY level ASC"#,
        )
        .bind(building_id)
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Floor>("SELECT * FROM floors WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        building_id: Uuid,
        data: &CreateFloor,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Floor>(
            r#"INSERT INTO floors (id, organisation_id, building_id, name, level)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(building_id)
        .bind(&data.name)
        .bind(data.level)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateFloor,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Floor>(
            r#"UPDATE floors
               SET name = $3, level = $4, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.name)
        .bind(data.level)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_floor_plan_path(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        path: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Floor>(
            r#"UPDATE floors
               SET floor_plan_path = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(path)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM floors WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
