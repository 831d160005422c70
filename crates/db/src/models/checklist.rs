use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChecklistTemplate {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub room_type_id: Option<Uuid>,
    pub is_default: bool, // default for room_type_id
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub template_id: Uuid,
    pub label: String,
    pub position: i64,
    pub requires_photo: bool,
    pub requires_note: bool,
    pub created_at: DateTime<Utc>,
}

/// Room-level replacement for the room type's default template.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RoomChecklistOverride {
    pub room_id: Uuid,
    pub organisation_id: Uuid,
    pub template_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChecklistTemplateWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub template: ChecklistTemplate,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChecklistTemplate {
    pub name: String,
    pub room_type_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateChecklistTemplate {
    pub name: String,
    pub room_type_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateChecklistItem {
    pub label: String,
    #[serde(default)]
    pub requires_photo: bool,
    #[serde(default)]
    pub requires_note: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateChecklistItem {
    pub label: String,
    pub requires_photo: bool,
    pub requires_note: bool,
}

impl ChecklistTemplate {
    pub async fn find_by_organisation(
        pool: &SqlitePool,
        organisation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistTemplate>(
            "SELECT * FROM checklist_templates WHERE organisation_id = $1 ORDER BY name ASC",
        )
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistTemplate>(
            "SELECT * FROM checklist_templates WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_default_for_room_type(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_type_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistTemplate>(
            r#"SELECT * FROM checklist_templates
               WHERE organisation_id = $1 AND room_type_id = $2 AND is_default = 1"#,
        )
        .bind(organisation_id)
        .bind(room_type_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        data: &CreateChecklistTemplate,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChecklistTemplate>(
            r#"INSERT INTO checklist_templates (id, organisation_id, name, room_type_id)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(&data.name)
        .bind(data.room_type_id)
        .fetch_one(pool)
        .await
    }

    /// Changing the room type drops the default flag.
    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateChecklistTemplate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistTemplate>(
            r#"UPDATE checklist_templates
               SET name = $3,
                   is_default = CASE WHEN room_type_id IS $4 THEN is_default ELSE 0 END,
                   room_type_id = $4,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.name)
        .bind(data.room_type_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn clear_default_for_room_type<'e, E>(
        executor: E,
        organisation_id: Uuid,
        room_type_id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE checklist_templates
               SET is_default = 0, updated_at = datetime('now', 'subsec')
               WHERE organisation_id = $1 AND room_type_id = $2 AND is_default = 1"#,
        )
        .bind(organisation_id)
        .bind(room_type_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_default<'e, E>(
        executor: E,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"UPDATE checklist_templates
               SET is_default = 1, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND room_type_id IS NOT NULL"#,
        )
        .bind(id)
        .bind(organisation_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn unmark_default(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE checklist_templates
               SET is_default = 0, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2"#,
        )
        .bind(id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM checklist_templates WHERE id = $1 AND organisation_id = $2")
                .bind(id)
                .bind(organisation_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

impl ChecklistItem {
    /// Items of a template in checklist order.
    pub async fn find_by_template(
        pool: &SqlitePool,
        organisation_id: Uuid,
        template_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(
            r#"SELECT * FROM checklist_items
               WHERE template_id = $1 AND organisation_id = $2
               ORDER BY position ASC, created_at ASC"#,
        )
        .bind(template_id)
        .bind(organisation_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(
            "SELECT * FROM checklist_items WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    /// Appends the item after the template's current last position.
    pub async fn create(
        pool: &SqlitePool,
        organisation_id: Uuid,
        template_id: Uuid,
        data: &CreateChecklistItem,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(
            r#"INSERT INTO checklist_items
                   (id, organisation_id, template_id, label, position, requires_photo, requires_note)
               VALUES ($1, $2, $3, $4,
                       (SELECT COALESCE(MAX(position), -1) + 1 FROM checklist_items WHERE template_id = $3),
                       $5, $6)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(template_id)
        .bind(&data.label)
        .bind(data.requires_photo)
        .bind(data.requires_note)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        data: &UpdateChecklistItem,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(
            r#"UPDATE checklist_items
               SET label = $3, requires_photo = $4, requires_note = $5
               WHERE id = $1 AND organisation_id = $2
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(&data.label)
        .bind(data.requires_photo)
        .bind(data.requires_note)
        .fetch_optional(pool)
        .await
    }

    pub async fn set_position<'e, E>(
        executor: E,
        template_id: Uuid,
        id: Uuid,
        position: i64,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE checklist_items SET position = $3 WHERE id = $1 AND template_id = $2",
        )
        .bind(id)
        .bind(template_id)
        .bind(position)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM checklist_items WHERE id = $1 AND organisation_id = $2")
                .bind(id)
                .bind(organisation_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

impl RoomChecklistOverride {
    pub async fn find_by_room(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomChecklistOverride>(
            "SELECT * FROM room_checklist_overrides WHERE room_id = $1 AND organisation_id = $2",
        )
        .bind(room_id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn upsert(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_id: Uuid,
        template_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RoomChecklistOverride>(
            r#"INSERT INTO room_checklist_overrides (room_id, organisation_id, template_id)
               VALUES ($1, $2, $3)
               ON CONFLICT(room_id) DO UPDATE SET
                   template_id = excluded.template_id,
                   created_at = datetime('now', 'subsec')
               RETURNING *"#,
        )
        .bind(room_id)
        .bind(organisation_id)
        .bind(template_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM room_checklist_overrides WHERE room_id = $1 AND organisation_id = $2",
        )
        .bind(room_id)
        .bind(organisation_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
