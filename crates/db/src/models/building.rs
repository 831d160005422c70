use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::floor::Floor;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Building {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct BuildingWithFloors {
    #[serde(flatten)]
    #[ts(flatten)]
    pub building: Building,
    pub floors: Vec<Floor>,
}

/// Floor definition supplied when creating a building.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NewFloor {
    pub name: String,
    pub level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateBuilding {
    pub client_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    #[serde(default)]
    pub floors: Vec<NewFloor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateBuilding {
    pub name: String,
    pub address: Option<String>,
}

impl Building {
    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
        client_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Building>(
            r#"SELECT * FROM buildings
               WHERE organisation_id = $1 AND ($2 IS NULL OR client_id = $2)
               ORDER BY name ASC"#,
        )
        .bind(organisation_id)
        .bind(client_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Building>(
            "SELECT * FROM buildings WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        data: &CreateBuilding,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Building>(
            r#"INSERT INTO buildings (id, organisation_id, client_id, name, address)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(data.client_id)
        .bind(&data.name)
        .bind(&data.address)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateBuilding,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Building>(
            r#"UPDATE buildings
               SET name = $3, address = $4, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.name)
        .bind(&data.address)
        .fetch_optional(pool)
        .await
    }

    /// Deletes the building; floors, rooms and activities cascade.
    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM buildings WHERE id = $1 AND organisation_id = $2")
            .bind(id)
            .bind(organisation_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
