use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::cleaning_activity::ActivityStatus;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "room_task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoomTaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
    InspectedPass,
    InspectedFail,
    HasIssues,
}

impl RoomTaskStatus {
    pub fn is_inspected(self) -> bool {
        matches!(
            self,
            RoomTaskStatus::InspectedPass | RoomTaskStatus::InspectedFail
        )
    }

    /// Checklist responses may still be recorded.
    pub fn accepts_responses(self) -> bool {
        matches!(
            self,
            RoomTaskStatus::NotStarted | RoomTaskStatus::InProgress | RoomTaskStatus::HasIssues
        )
    }
}

/// Outcome a supervisor records for a finished room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum InspectionOutcome {
    Pass,
    Fail,
}

impl From<InspectionOutcome> for RoomTaskStatus {
    fn from(outcome: InspectionOutcome) -> Self {
        match outcome {
            InspectionOutcome::Pass => RoomTaskStatus::InspectedPass,
            InspectionOutcome::Fail => RoomTaskStatus::InspectedFail,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RoomTask {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub activity_id: Uuid,
    pub room_id: Uuid,
    pub status: RoomTaskStatus,
    pub assigned_to: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub inspected_at: Option<DateTime<Utc>>,
    pub inspected_by: Option<Uuid>,
    pub inspection_note: Option<String>,
    pub issue_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Room task joined with its room and activity, for task lists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct RoomTaskDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub task: RoomTask,
    pub room_name: String,
    pub activity_name: String,
    pub activity_status: ActivityStatus,
    pub assignee_name: Option<String>,
}

/// Room assignment applied when room tasks are created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct RoomAssignment {
    pub room_id: Uuid,
    pub user_id: Uuid,
}

const DETAIL_SELECT: &str = r#"SELECT
    t.*,
    r.name   AS room_name,
    a.name   AS activity_name,
    a.status AS activity_status,
    u.full_name AS assignee_name
FROM room_tasks t
JOIN rooms r ON r.id = t.room_id
JOIN cleaning_activities a ON a.id = t.activity_id
LEFT JOIN users u ON u.id = t.assigned_to"#;

impl RoomTask {
    pub async fn find_by_id(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomTask>(
            "SELECT * FROM room_tasks WHERE id = $1 AND organisation_id = $2",
        )
        .bind(id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_details_by_activity(
        pool: &SqlitePool,
        organisation_id: Uuid,
        activity_id: Uuid,
    ) -> Result<Vec<RoomTaskDetail>, sqlx::Error> {
        let sql = format!(
            "{DETAIL_SELECT} WHERE t.activity_id = $1 AND t.organisation_id = $2 ORDER BY r.name ASC"
        );
        sqlx::query_as::<_, RoomTaskDetail>(&sql)
            .bind(activity_id)
            .bind(organisation_id)
            .fetch_all(pool)
            .await
    }

    /// Tasks assigned to a janitor in published activities.
    pub async fn find_details_for_assignee(
        pool: &SqlitePool,
        organisation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<RoomTaskDetail>, sqlx::Error> {
        let sql = format!(
            r#"{DETAIL_SELECT}
               WHERE t.assigned_to = $1 AND t.organisation_id = $2 AND a.status = 'active'
               ORDER BY a.scheduled_date ASC, r.name ASC"#
        );
        sqlx::query_as::<_, RoomTaskDetail>(&sql)
            .bind(user_id)
            .bind(organisation_id)
            .fetch_all(pool)
            .await
    }

    /// Latest task for a room in a published activity, used by QR scans.
    pub async fn find_open_for_room(
        pool: &SqlitePool,
        organisation_id: Uuid,
        room_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomTask>(
            r#"SELECT t.* FROM room_tasks t
               JOIN cleaning_activities a ON a.id = t.activity_id
               WHERE t.room_id = $1 AND t.organisation_id = $2 AND a.status = 'active'
               ORDER BY a.scheduled_date DESC
               LIMIT 1"#,
        )
        .bind(room_id)
        .bind(organisation_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organisation_id: Uuid,
        activity_id: Uuid,
        room_id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, RoomTask>(
            r#"INSERT INTO room_tasks (id, organisation_id, activity_id, room_id, assigned_to)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(organisation_id)
        .bind(activity_id)
        .bind(room_id)
        .bind(assigned_to)
        .fetch_one(executor)
        .await
    }

    pub async fn count_assigned(
        pool: &SqlitePool,
        organisation_id: Uuid,
        activity_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM room_tasks
               WHERE activity_id = $1 AND organisation_id = $2 AND assigned_to IS NOT NULL"#,
        )
        .bind(activity_id)
        .bind(organisation_id)
        .fetch_one(pool)
        .await
    }

    /// Reassigns a task that has not been inspected yet.
    pub async fn assign(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        assigned_to: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomTask>(
            r#"UPDATE room_tasks
               SET assigned_to = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
                 AND status NOT IN ('inspected_pass', 'inspected_fail')
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(assigned_to)
        .fetch_optional(pool)
        .await
    }

    /// `not_started -> in_progress`.
    pub async fn start(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomTask>(
            r#"UPDATE room_tasks
               SET status = 'in_progress', started_at = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'not_started'
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    /// `not_started | in_progress | has_issues -> done`, stamping the completion time.
    pub async fn complete(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, RoomTask>(
            r#"UPDATE room_tasks
               SET status = 'done',
                   started_at = COALESCE(started_at, $3),
                   completed_at = $3,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2
                 AND status IN ('not_started', 'in_progress', 'has_issues')
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(now)
        .fetch_optional(pool)
        .await
    }

    /// `in_progress -> has_issues`.
    pub async fn flag_issues(
        pool: &SqlitePool,
        organisation_id: Uuid,
        id: Uuid,
        note: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RoomTask>(
            r#"UPDATE room_tasks
               SET status = 'has_issues', issue_note = $3, updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status = 'in_progress'
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(note)
        .fetch_optional(pool)
        .await
    }

    /// `done | has_issues -> inspected_pass | inspected_fail`.
    pub async fn inspect<'e, E>(
        executor: E,
        organisation_id: Uuid,
        id: Uuid,
        outcome: InspectionOutcome,
        inspected_by: Uuid,
        note: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, RoomTask>(
            r#"UPDATE room_tasks
               SET status = $3, inspected_at = $4, inspected_by = $5, inspection_note = $6,
                   updated_at = datetime('now', 'subsec')
               WHERE id = $1 AND organisation_id = $2 AND status IN ('done', 'has_issues')
               RETURNING *"#,
        )
        .bind(id)
        .bind(organisation_id)
        .bind(RoomTaskStatus::from(outcome))
        .bind(Utc::now())
        .bind(inspected_by)
        .bind(note)
        .fetch_optional(executor)
        .await
    }
}
