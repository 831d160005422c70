use std::collections::HashSet;

use db::models::{
    activity_template::{ActivityTemplate, CreateActivityTemplate},
    cleaning_activity::CleaningActivity,
    floor::Floor,
    room::Room,
    room_task::{RoomAssignment, RoomTask},
    user::{Role, User},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{STAFF, Scope},
    error::{ActionError, Found, StoreContext},
    validation::{required_text, time_window},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TemplateFromActivity {
    pub activity_id: Uuid,
    pub name: String,
}

#[derive(Clone)]
pub struct ActivityTemplateService {
    pool: SqlitePool,
}

impl ActivityTemplateService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        floor_id: Option<Uuid>,
    ) -> Result<Vec<ActivityTemplate>, ActionError> {
        scope.require(STAFF)?;
        ActivityTemplate::find_by_organisation(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to load activity templates")
    }

    pub async fn create(
        &self,
        scope: &Scope,
        data: &CreateActivityTemplate,
    ) -> Result<ActivityTemplate, ActionError> {
        scope.require(STAFF)?;
        time_window(data.window_start, data.window_end)?;
        Floor::find_by_id(&self.pool, scope.org_id(), data.floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")?;

        let rooms: HashSet<Uuid> = Room::find_by_floor(&self.pool, scope.org_id(), data.floor_id)
            .await
            .store("Failed to load rooms")?
            .into_iter()
            .map(|room| room.id)
            .collect();
        let janitors: HashSet<Uuid> =
            User::find_by_organisation(&self.pool, scope.org_id(), Some(Role::Janitor))
                .await
                .store("Failed to load janitors")?
                .into_iter()
                .filter(|user| user.is_active)
                .map(|user| user.id)
                .collect();
        let mut seen = HashSet::new();
        for assignment in &data.default_assignments {
            if !rooms.contains(&assignment.room_id) {
                return Err(ActionError::validation("Assigned rooms must be on the template's floor"));
            }
            if !janitors.contains(&assignment.user_id) {
                return Err(ActionError::validation("Assignee must be an active janitor"));
            }
            if !seen.insert(assignment.room_id) {
                return Err(ActionError::validation("Each room can only be assigned once"));
            }
        }

        let data = CreateActivityTemplate {
            name: required_text("Name", &data.name, 120)?,
            floor_id: data.floor_id,
            window_start: data.window_start,
            window_end: data.window_end,
            default_assignments: data.default_assignments.clone(),
        };
        let template = ActivityTemplate::create(&self.pool, scope.org_id(), &data, scope.user_id)
            .await
            .store_or_conflict(
                "Failed to create activity template",
                "An activity template with this name already exists",
            )?;
        info!(template_id = %template.id, floor_id = %template.floor_id, "Activity template created");
        Ok(template)
    }

    /// Capture an existing activity's floor, window and assignments.
    pub async fn create_from_activity(
        &self,
        scope: &Scope,
        data: &TemplateFromActivity,
    ) -> Result<ActivityTemplate, ActionError> {
        scope.require(STAFF)?;
        let activity = CleaningActivity::find_by_id(&self.pool, scope.org_id(), data.activity_id)
            .await
            .store("Failed to load activity")?
            .found("Activity")?;
        let default_assignments = RoomTask::find_details_by_activity(&self.pool, scope.org_id(), activity.id)
            .await
            .store("Failed to load room tasks")?
            .into_iter()
            .filter_map(|detail| {
                detail.task.assigned_to.map(|user_id| RoomAssignment {
                    room_id: detail.task.room_id,
                    user_id,
                })
            })
            .collect();

        self.create(
            scope,
            &CreateActivityTemplate {
                name: data.name.clone(),
                floor_id: activity.floor_id,
                window_start: activity.window_start,
                window_end: activity.window_end,
                default_assignments,
            },
        )
        .await
    }

    pub async fn delete(&self, scope: &Scope, template_id: Uuid) -> Result<(), ActionError> {
        scope.require(STAFF)?;
        let deleted = ActivityTemplate::delete(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to delete activity template")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Activity template"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};
    use db::models::cleaning_activity::CreateCleaningActivity;

    use super::*;
    use crate::services::{
        activity::{ActivityService, AssignRoomTask},
        test_support::Fixture,
    };

    #[tokio::test]
    async fn template_captures_an_activity() {
        let fx = Fixture::new().await;
        let sup = fx.supervisor();
        let activities = ActivityService::new(fx.pool());
        let detail = activities
            .create(
                &sup,
                &CreateCleaningActivity {
                    floor_id: fx.floor_id,
                    name: "Friday deep clean".to_string(),
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 6, 5).unwrap(),
                    window_start: NaiveTime::from_hms_opt(17, 0, 0),
                    window_end: NaiveTime::from_hms_opt(23, 0, 0),
                    notes: None,
                    template_id: None,
                },
            )
            .await
            .unwrap();
        activities
            .assign_task(&sup, detail.tasks[0].task.id, &AssignRoomTask { user_id: Some(fx.janitor_id) })
            .await
            .unwrap();

        let service = ActivityTemplateService::new(fx.pool());
        let template = service
            .create_from_activity(
                &sup,
                &TemplateFromActivity {
                    activity_id: detail.summary.activity.id,
                    name: "Friday".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(template.floor_id, fx.floor_id);
        assert_eq!(template.window_end, NaiveTime::from_hms_opt(23, 0, 0));
        assert_eq!(template.default_assignments.0.len(), 1);

        assert_eq!(service.list(&sup, Some(fx.floor_id)).await.unwrap().len(), 1);
        service.delete(&sup, template.id).await.unwrap();
        assert!(service.list(&sup, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assignments_must_name_janitors_on_the_floor() {
        let fx = Fixture::new().await;
        let service = ActivityTemplateService::new(fx.pool());
        let err = service
            .create(
                &fx.supervisor(),
                &CreateActivityTemplate {
                    name: "Bad".to_string(),
                    floor_id: fx.floor_id,
                    window_start: None,
                    window_end: None,
                    default_assignments: vec![RoomAssignment {
                        room_id: fx.room_ids[0],
                        user_id: fx.admin_id,
                    }],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Assignee must be an active janitor");
    }
}
