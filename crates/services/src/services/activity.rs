//! Cleaning activities: scheduling, room-task assignment and the
//! `draft -> active -> closed` lifecycle.

use std::collections::{HashMap, HashSet};

use db::models::{
    activity_template::ActivityTemplate,
    cleaning_activity::{
        ActivityStatus, ActivitySummary, CleaningActivity, CreateCleaningActivity,
        UpdateCleaningActivity,
    },
    floor::Floor,
    room::Room,
    room_task::{RoomTask, RoomTaskDetail},
    user::{Role, User},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{STAFF, Scope},
    error::{ActionError, Found, StoreContext},
    validation::{optional_text, required_text, time_window},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ActivityDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub summary: ActivitySummary,
    pub tasks: Vec<RoomTaskDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssignRoomTask {
    pub user_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ActivityService {
    pool: SqlitePool,
}

impl ActivityService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, scope: &Scope, activity_id: Uuid) -> Result<CleaningActivity, ActionError> {
        CleaningActivity::find_by_id(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to load activity")?
            .found("Activity")
    }

    pub async fn list(
        &self,
        scope: &Scope,
        status: Option<ActivityStatus>,
        client_id: Option<Uuid>,
    ) -> Result<Vec<ActivitySummary>, ActionError> {
        scope.require(STAFF)?;
        CleaningActivity::find_summaries(&self.pool, scope.org_id(), status, client_id)
            .await
            .store("Failed to load activities")
    }

    pub async fn get(&self, scope: &Scope, activity_id: Uuid) -> Result<ActivityDetail, ActionError> {
        scope.require(STAFF)?;
        let summary = CleaningActivity::find_summary(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to load activity")?
            .found("Activity")?;
        let tasks = RoomTask::find_details_by_activity(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to load room tasks")?;
        Ok(ActivityDetail { summary, tasks })
    }

    /// Create a draft with one room task per active room on the floor, in one
    /// transaction. A template fills in the window and default assignees.
    pub async fn create(
        &self,
        scope: &Scope,
        data: &CreateCleaningActivity,
    ) -> Result<ActivityDetail, ActionError> {
        scope.require(STAFF)?;
        Floor::find_by_id(&self.pool, scope.org_id(), data.floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")?;

        let template = match data.template_id {
            Some(template_id) => {
                let template = ActivityTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
                    .await
                    .store("Failed to load activity template")?
                    .found("Activity template")?;
                if template.floor_id != data.floor_id {
                    return Err(ActionError::validation(
                        "The template belongs to a different floor",
                    ));
                }
                Some(template)
            }
            None => None,
        };

        let (window_start, window_end) = match (&template, data.window_start, data.window_end) {
            (Some(template), None, None) => (template.window_start, template.window_end),
            (_, start, end) => (start, end),
        };
        time_window(window_start, window_end)?;

        let data = CreateCleaningActivity {
            floor_id: data.floor_id,
            name: required_text("Name", &data.name, 120)?,
            scheduled_date: data.scheduled_date,
            window_start,
            window_end,
            notes: optional_text("Notes", data.notes.as_deref(), 2000)?,
            template_id: data.template_id,
        };

        // Default assignees must still be active janitors.
        let janitors: HashSet<Uuid> = User::find_by_organisation(&self.pool, scope.org_id(), Some(Role::Janitor))
            .await
            .store("Failed to load janitors")?
            .into_iter()
            .filter(|user| user.is_active)
            .map(|user| user.id)
            .collect();
        let defaults: HashMap<Uuid, Uuid> = template
            .map(|t| t.default_assignments.0)
            .unwrap_or_default()
            .into_iter()
            .filter(|a| janitors.contains(&a.user_id))
            .map(|a| (a.room_id, a.user_id))
            .collect();

        let activity_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await.store("Failed to create activity")?;
        let rooms = Room::find_active_by_floor(&mut *tx, scope.org_id(), data.floor_id)
            .await
            .store("Failed to create activity")?;
        if rooms.is_empty() {
            return Err(ActionError::validation("Floor has no active rooms"));
        }
        CleaningActivity::create(&mut *tx, scope.org_id(), &data, scope.user_id, activity_id)
            .await
            .store("Failed to create activity")?;
        for room in &rooms {
            RoomTask::create(
                &mut *tx,
                scope.org_id(),
                activity_id,
                room.id,
                defaults.get(&room.id).copied(),
            )
            .await
            .store("Failed to create activity")?;
        }
        tx.commit().await.store("Failed to create activity")?;

        info!(
            activity_id = %activity_id,
            floor_id = %data.floor_id,
            rooms = rooms.len(),
            prefilled = defaults.len(),
            "Activity created"
        );
        self.get(scope, activity_id).await
    }

    pub async fn update(
        &self,
        scope: &Scope,
        activity_id: Uuid,
        data: &UpdateCleaningActivity,
    ) -> Result<CleaningActivity, ActionError> {
        scope.require(STAFF)?;
        time_window(data.window_start, data.window_end)?;
        let data = UpdateCleaningActivity {
            name: required_text("Name", &data.name, 120)?,
            scheduled_date: data.scheduled_date,
            window_start: data.window_start,
            window_end: data.window_end,
            notes: optional_text("Notes", data.notes.as_deref(), 2000)?,
        };
        self.load(scope, activity_id).await?;
        CleaningActivity::update_draft(&self.pool, scope.org_id(), activity_id, &data)
            .await
            .store("Failed to update activity")?
            .ok_or_else(|| ActionError::invalid_state("Only draft activities can be edited"))
    }

    pub async fn delete(&self, scope: &Scope, activity_id: Uuid) -> Result<(), ActionError> {
        scope.require(STAFF)?;
        self.load(scope, activity_id).await?;
        let deleted = CleaningActivity::delete_draft(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to delete activity")?;
        if deleted == 0 {
            return Err(ActionError::invalid_state("Only draft activities can be deleted"));
        }
        info!(activity_id = %activity_id, "Activity deleted");
        Ok(())
    }

    pub async fn publish(&self, scope: &Scope, activity_id: Uuid) -> Result<CleaningActivity, ActionError> {
        scope.require(STAFF)?;
        self.load(scope, activity_id).await?;

        let assigned = RoomTask::count_assigned(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to publish activity")?;
        if assigned == 0 {
            return Err(ActionError::invalid_state(
                "Assign at least one janitor before publishing",
            ));
        }

        let updated = CleaningActivity::publish(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to publish activity")?;
        if updated == 0 {
            return Err(ActionError::invalid_state("Only draft activities can be published"));
        }
        info!(activity_id = %activity_id, assigned, "Activity published");
        self.load(scope, activity_id).await
    }

    pub async fn close(&self, scope: &Scope, activity_id: Uuid) -> Result<CleaningActivity, ActionError> {
        scope.require(STAFF)?;
        self.load(scope, activity_id).await?;
        let updated = CleaningActivity::close(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to close activity")?;
        if updated == 0 {
            return Err(ActionError::invalid_state("Only active activities can be closed"));
        }
        info!(activity_id = %activity_id, "Activity closed");
        self.load(scope, activity_id).await
    }

    pub async fn cancel(&self, scope: &Scope, activity_id: Uuid) -> Result<CleaningActivity, ActionError> {
        scope.require(STAFF)?;
        self.load(scope, activity_id).await?;
        let updated = CleaningActivity::cancel(&self.pool, scope.org_id(), activity_id)
            .await
            .store("Failed to cancel activity")?;
        if updated == 0 {
            return Err(ActionError::invalid_state(
                "Only draft or active activities can be cancelled",
            ));
        }
        info!(activity_id = %activity_id, "Activity cancelled");
        self.load(scope, activity_id).await
    }

    /// Assign (or with `None`, unassign) the janitor for one room task.
    pub async fn assign_task(
        &self,
        scope: &Scope,
        task_id: Uuid,
        data: &AssignRoomTask,
    ) -> Result<RoomTask, ActionError> {
        scope.require(STAFF)?;
        let task = RoomTask::find_by_id(&self.pool, scope.org_id(), task_id)
            .await
            .store("Failed to load room task")?
            .found("Room task")?;
        let activity = self.load(scope, task.activity_id).await?;
        if !activity.status.is_open() {
            return Err(ActionError::invalid_state(
                "Rooms can only be assigned in draft or active activities",
            ));
        }
        if task.status.is_inspected() {
            return Err(ActionError::invalid_state("Inspected rooms cannot be reassigned"));
        }

        if let Some(user_id) = data.user_id {
            User::find_active_janitor(&self.pool, scope.org_id(), user_id)
                .await
                .store("Failed to load janitor")?
                .ok_or_else(|| ActionError::validation("Assignee must be an active janitor"))?;
        }

        let task = RoomTask::assign(&self.pool, scope.org_id(), task_id, data.user_id)
            .await
            .store("Failed to assign room")?
            .ok_or_else(|| ActionError::invalid_state("Inspected rooms cannot be reassigned"))?;
        debug!(task_id = %task.id, assignee = ?task.assigned_to, "Room task assigned");
        Ok(task)
    }
}
