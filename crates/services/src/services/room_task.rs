//! Janitor execution of room tasks and supervisor inspection.

use db::models::{
    checklist::{ChecklistItem, ChecklistTemplateWithItems},
    cleaning_activity::{ActivityStatus, CleaningActivity},
    deficiency::{CreateDeficiency, Deficiency, DeficiencySeverity},
    room::Room,
    room_task::{InspectionOutcome, RoomTask, RoomTaskDetail, RoomTaskStatus},
    task_item_response::{TaskItemResponse, UpsertTaskItemResponse},
    user::Role,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{JANITOR, STAFF, Scope},
    checklist::{ChecklistService, validate_completion},
    deficiency::DeficiencyService,
    error::{ActionError, Found, StoreContext},
    storage::{ObjectStore, UploadKind, store_upload},
    validation::{optional_text, required_text},
};

/// Everything a janitor or inspector needs on the room screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RoomTaskView {
    pub task: RoomTask,
    pub room: Room,
    pub activity: CleaningActivity,
    pub checklist: Option<ChecklistTemplateWithItems>,
    pub responses: Vec<TaskItemResponse>,
    pub deficiencies: Vec<Deficiency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FlagIssues {
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RaiseDeficiency {
    pub description: String,
    #[serde(default)]
    pub severity: DeficiencySeverity,
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct InspectRoomTask {
    pub outcome: InspectionOutcome,
    pub note: Option<String>,
    /// Only accepted with a failing outcome.
    pub deficiency: Option<RaiseDeficiency>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct InspectionResult {
    pub task: RoomTask,
    pub deficiency: Option<Deficiency>,
}

#[derive(Clone)]
pub struct RoomTaskService {
    pool: SqlitePool,
    checklists: ChecklistService,
    deficiencies: DeficiencyService,
}

impl RoomTaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            checklists: ChecklistService::new(pool.clone()),
            deficiencies: DeficiencyService::new(pool.clone()),
            pool,
        }
    }

    async fn load(&self, scope: &Scope, task_id: Uuid) -> Result<(RoomTask, CleaningActivity), ActionError> {
        let task = RoomTask::find_by_id(&self.pool, scope.org_id(), task_id)
            .await
            .store("Failed to load room task")?
            .found("Room task")?;
        let activity = CleaningActivity::find_by_id(&self.pool, scope.org_id(), task.activity_id)
            .await
            .store("Failed to load activity")?
            .found("Activity")?;
        Ok((task, activity))
    }

    /// The caller must be the assignee and the activity must be running.
    async fn load_assigned(&self, scope: &Scope, task_id: Uuid) -> Result<RoomTask, ActionError> {
        scope.require(JANITOR)?;
        let (task, activity) = self.load(scope, task_id).await?;
        if task.assigned_to != Some(scope.user_id) {
            debug!(task_id = %task.id, user_id = %scope.user_id, "Room task not assigned to caller");
            return Err(ActionError::Unauthorized);
        }
        if activity.status != ActivityStatus::Active {
            return Err(ActionError::invalid_state("This activity is not active"));
        }
        Ok(task)
    }

    async fn room(&self, scope: &Scope, room_id: Uuid) -> Result<Room, ActionError> {
        Room::find_by_id(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to load room")?
            .found("Room")
    }

    async fn checklist_item(
        &self,
        scope: &Scope,
        task: &RoomTask,
        item_id: Uuid,
    ) -> Result<ChecklistItem, ActionError> {
        let room = self.room(scope, task.room_id).await?;
        self.checklists
            .effective_items(scope.org_id(), &room)
            .await?
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| ActionError::validation("This item is not on the room's checklist"))
    }

    pub async fn my_tasks(&self, scope: &Scope) -> Result<Vec<RoomTaskDetail>, ActionError> {
        scope.require(JANITOR)?;
        RoomTask::find_details_for_assignee(&self.pool, scope.org_id(), scope.user_id)
            .await
            .store("Failed to load your rooms")
    }

    pub async fn view(&self, scope: &Scope, task_id: Uuid) -> Result<RoomTaskView, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor, Role::Janitor])?;
        let (task, activity) = self.load(scope, task_id).await?;
        if scope.is(Role::Janitor) && task.assigned_to != Some(scope.user_id) {
            return Err(ActionError::Unauthorized);
        }

        let room = self.room(scope, task.room_id).await?;
        let checklist = match self.checklists.effective_template(scope.org_id(), &room).await? {
            Some(template) => {
                let items = ChecklistItem::find_by_template(&self.pool, scope.org_id(), template.id)
                    .await
                    .store("Failed to load checklist items")?;
                Some(ChecklistTemplateWithItems { template, items })
            }
            None => None,
        };
        let responses = TaskItemResponse::find_by_task(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to load responses")?;
        let deficiencies = Deficiency::find_by_room_task(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to load deficiencies")?;

        Ok(RoomTaskView {
            task,
            room,
            activity,
            checklist,
            responses,
            deficiencies,
        })
    }

    /// The caller's task for a room in a running activity, used by QR landings.
    pub async fn open_task_for_room(&self, scope: &Scope, room_id: Uuid) -> Result<RoomTaskView, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor, Role::Janitor])?;
        let task = RoomTask::find_open_for_room(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to load room task")?
            .found("Room task")?;
        self.view(scope, task.id).await
    }

    pub async fn start(&self, scope: &Scope, task_id: Uuid) -> Result<RoomTask, ActionError> {
        let task = self.load_assigned(scope, task_id).await?;
        let task = RoomTask::start(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to start room")?
            .ok_or_else(|| ActionError::invalid_state("This room has already been started"))?;
        info!(task_id = %task.id, user_id = %scope.user_id, "Room started");
        Ok(task)
    }

    /// Record one checklist response. The first response also starts the room.
    pub async fn respond(
        &self,
        scope: &Scope,
        task_id: Uuid,
        data: &UpsertTaskItemResponse,
    ) -> Result<TaskItemResponse, ActionError> {
        let task = self.load_assigned(scope, task_id).await?;
        if !task.status.accepts_responses() {
            return Err(ActionError::invalid_state("This room is already finished"));
        }
        self.checklist_item(scope, &task, data.checklist_item_id).await?;

        let data = UpsertTaskItemResponse {
            checklist_item_id: data.checklist_item_id,
            completed: data.completed,
            note: optional_text("Note", data.note.as_deref(), 2000)?,
        };
        let response = TaskItemResponse::upsert(&self.pool, scope.org_id(), task.id, &data, scope.user_id)
            .await
            .store("Failed to save response")?;

        if task.status == RoomTaskStatus::NotStarted {
            // Lost races leave the task as the other request left it.
            RoomTask::start(&self.pool, scope.org_id(), task.id)
                .await
                .store("Failed to start room")?;
        }
        Ok(response)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn attach_photo(
        &self,
        scope: &Scope,
        store: &dyn ObjectStore,
        task_id: Uuid,
        item_id: Uuid,
        content_type: &str,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<TaskItemResponse, ActionError> {
        let task = self.load_assigned(scope, task_id).await?;
        if !task.status.accepts_responses() {
            return Err(ActionError::invalid_state("This room is already finished"));
        }
        self.checklist_item(scope, &task, item_id).await?;
        let previous = TaskItemResponse::find_by_task(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to load responses")?
            .into_iter()
            .find(|r| r.checklist_item_id == item_id)
            .and_then(|r| r.photo_path);

        let key = store_upload(
            store,
            UploadKind::Photo,
            (scope.org_id(), "room_tasks", task.id),
            content_type,
            bytes,
            max_bytes,
        )
        .await?;
        let response =
            match TaskItemResponse::set_photo(&self.pool, scope.org_id(), task.id, item_id, &key, scope.user_id)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    if let Err(cleanup) = store.delete(&key).await {
                        warn!(error = %cleanup, key = %key, "Failed to remove orphaned photo");
                    }
                    return Err::<TaskItemResponse, _>(e).store("Failed to save photo");
                }
            };
        debug!(task_id = %task.id, item_id = %item_id, key = %key, "Photo attached");
        if let Some(previous) = previous.filter(|p| *p != key) {
            if let Err(e) = store.delete(&previous).await {
                warn!(error = %e, key = %previous, "Failed to remove replaced photo");
            }
        }
        Ok(response)
    }

    /// Finish the room once every checklist item is satisfied.
    pub async fn complete(&self, scope: &Scope, task_id: Uuid) -> Result<RoomTask, ActionError> {
        let task = self.load_assigned(scope, task_id).await?;
        let room = self.room(scope, task.room_id).await?;
        let items = self.checklists.effective_items(scope.org_id(), &room).await?;
        let responses = TaskItemResponse::find_by_task(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to load responses")?;
        validate_completion(&items, &responses)?;

        let task = RoomTask::complete(&self.pool, scope.org_id(), task.id)
            .await
            .store("Failed to complete room")?
            .ok_or_else(|| ActionError::invalid_state("This room is already finished"))?;
        info!(task_id = %task.id, user_id = %scope.user_id, items = items.len(), "Room completed");
        Ok(task)
    }

    pub async fn flag_issues(
        &self,
        scope: &Scope,
        task_id: Uuid,
        data: &FlagIssues,
    ) -> Result<RoomTask, ActionError> {
        let note = required_text("Note", &data.note, 2000)?;
        let task = self.load_assigned(scope, task_id).await?;
        let task = RoomTask::flag_issues(&self.pool, scope.org_id(), task.id, &note)
            .await
            .store("Failed to flag issues")?
            .ok_or_else(|| ActionError::invalid_state("Only rooms in progress can be flagged"))?;
        info!(task_id = %task.id, "Room flagged with issues");
        Ok(task)
    }

    pub async fn inspect(
        &self,
        scope: &Scope,
        task_id: Uuid,
        data: &InspectRoomTask,
    ) -> Result<InspectionResult, ActionError> {
        scope.require(STAFF)?;
        if data.deficiency.is_some() && data.outcome == InspectionOutcome::Pass {
            return Err(ActionError::validation(
                "Deficiencies can only be raised when an inspection fails",
            ));
        }
        let note = optional_text("Note", data.note.as_deref(), 2000)?;
        let (task, activity) = self.load(scope, task_id).await?;
        if activity.status != ActivityStatus::Active {
            return Err(ActionError::invalid_state("This activity is not active"));
        }

        let raise = match &data.deficiency {
            Some(raise) => Some(
                self.deficiencies
                    .checked(
                        scope,
                        &CreateDeficiency {
                            room_task_id: task.id,
                            description: raise.description.clone(),
                            severity: raise.severity,
                            assigned_to: raise.assigned_to,
                        },
                    )
                    .await?,
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await.store("Failed to save inspection")?;
        let task = RoomTask::inspect(
            &mut *tx,
            scope.org_id(),
            task.id,
            data.outcome,
            scope.user_id,
            note.as_deref(),
        )
        .await
        .store("Failed to save inspection")?
        .ok_or_else(|| ActionError::invalid_state("Only finished rooms can be inspected"))?;
        let deficiency = match &raise {
            Some(raise) => Some(
                Deficiency::create(&mut *tx, scope.org_id(), raise, scope.user_id)
                    .await
                    .store("Failed to save inspection")?,
            ),
            None => None,
        };
        tx.commit().await.store("Failed to save inspection")?;
        info!(task_id = %task.id, status = %task.status, inspector = %scope.user_id, "Room inspected");

        if let Some(deficiency) = &deficiency {
            info!(
                deficiency_id = %deficiency.id,
                room_task_id = %deficiency.room_task_id,
                severity = %deficiency.severity,
                "Deficiency raised"
            );
            self.deficiencies.notify_assignee(scope, deficiency).await;
        }
        Ok(InspectionResult { task, deficiency })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{
        checklist::{CreateChecklistItem, CreateChecklistTemplate},
        cleaning_activity::CreateCleaningActivity,
    };

    use super::*;
    use crate::services::{
        activity::{ActivityService, AssignRoomTask},
        storage::{LocalObjectStore, StorageError},
        test_support::Fixture,
    };

    /// Publish an activity with the first room assigned to the janitor and
    /// return that room's task id.
    async fn running_task(fx: &Fixture) -> Uuid {
        let activities = ActivityService::new(fx.pool());
        let sup = fx.supervisor();
        let detail = activities
            .create(
                &sup,
                &CreateCleaningActivity {
                    floor_id: fx.floor_id,
                    name: "Evening".to_string(),
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                    window_start: None,
                    window_end: None,
                    notes: None,
                    template_id: None,
                },
            )
            .await
            .unwrap();
        let task = detail
            .tasks
            .iter()
            .find(|t| t.task.room_id == fx.room_ids[0])
            .unwrap()
            .task
            .id;
        activities
            .assign_task(&sup, task, &AssignRoomTask { user_id: Some(fx.janitor_id) })
            .await
            .unwrap();
        activities.publish(&sup, detail.summary.activity.id).await.unwrap();
        task
    }

    /// Default checklist for the fixture's room type with one photo item.
    async fn photo_checklist(fx: &Fixture) -> ChecklistItem {
        let checklists = ChecklistService::new(fx.pool());
        let admin = fx.admin();
        let template = checklists
            .create_template(
                &admin,
                &CreateChecklistTemplate {
                    name: "Office".to_string(),
                    room_type_id: Some(fx.room_type_id),
                },
            )
            .await
            .unwrap();
        checklists.set_default(&admin, template.id).await.unwrap();
        checklists
            .add_item(
                &admin,
                template.id,
                &CreateChecklistItem {
                    label: "Mop floor".to_string(),
                    requires_photo: true,
                    requires_note: false,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn room_without_checklist_completes_immediately() {
        let fx = Fixture::new().await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;

        let task = service.complete(&fx.janitor(), task_id).await.unwrap();
        assert_eq!(task.status, RoomTaskStatus::Done);
        assert!(task.completed_at.is_some());
        assert!(task.started_at.is_some());
    }

    #[tokio::test]
    async fn photo_items_gate_completion() {
        let fx = Fixture::new().await;
        let item = photo_checklist(&fx).await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;
        let janitor = fx.janitor();

        service
            .respond(
                &janitor,
                task_id,
                &UpsertTaskItemResponse {
                    checklist_item_id: item.id,
                    completed: true,
                    note: None,
                },
            )
            .await
            .unwrap();
        let view = service.view(&janitor, task_id).await.unwrap();
        assert_eq!(view.task.status, RoomTaskStatus::InProgress);

        let err = service.complete(&janitor, task_id).await.unwrap_err();
        assert_eq!(err.to_string(), "Add a photo for \"Mop floor\" before finishing the room");

        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let response = service
            .attach_photo(&janitor, &store, task_id, item.id, "image/jpeg", b"jpeg", 1024)
            .await
            .unwrap();
        assert!(response.completed);
        assert!(response.photo_path.is_some());

        let task = service.complete(&janitor, task_id).await.unwrap();
        assert_eq!(task.status, RoomTaskStatus::Done);
        assert!(task.completed_at.is_some());

        let err = service
            .respond(
                &janitor,
                task_id,
                &UpsertTaskItemResponse {
                    checklist_item_id: item.id,
                    completed: false,
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This room is already finished");
    }

    #[tokio::test]
    async fn only_the_assignee_works_the_room() {
        let fx = Fixture::new().await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;

        let err = service.start(&fx.supervisor(), task_id).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));

        let other = db::models::user::User::create(
            &fx.pool(),
            fx.org.id,
            &db::models::user::CreateUser {
                email: "other@acme.test".to_string(),
                full_name: "Other".to_string(),
                role: Role::Janitor,
                client_id: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let err = service
            .start(&fx.scope(other.id, Role::Janitor), task_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }

    #[tokio::test]
    async fn failed_inspection_can_raise_a_deficiency() {
        let fx = Fixture::new().await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;
        let janitor = fx.janitor();

        service.start(&janitor, task_id).await.unwrap();
        let flagged = service
            .flag_issues(&janitor, task_id, &FlagIssues { note: "Broken tap".to_string() })
            .await
            .unwrap();
        assert_eq!(flagged.status, RoomTaskStatus::HasIssues);

        let pass_with_deficiency = InspectRoomTask {
            outcome: InspectionOutcome::Pass,
            note: None,
            deficiency: Some(RaiseDeficiency {
                description: "Tap".to_string(),
                severity: DeficiencySeverity::Low,
                assigned_to: None,
            }),
        };
        let err = service
            .inspect(&fx.supervisor(), task_id, &pass_with_deficiency)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));

        let result = service
            .inspect(
                &fx.supervisor(),
                task_id,
                &InspectRoomTask {
                    outcome: InspectionOutcome::Fail,
                    note: Some("Tap still leaking".to_string()),
                    deficiency: Some(RaiseDeficiency {
                        description: "Replace tap washer".to_string(),
                        severity: DeficiencySeverity::Medium,
                        assigned_to: Some(fx.janitor_id),
                    }),
                },
            )
            .await
            .unwrap();
        assert_eq!(result.task.status, RoomTaskStatus::InspectedFail);
        assert_eq!(result.task.inspected_by, Some(fx.supervisor_id));
        assert!(result.deficiency.is_some());

        let err = service
            .inspect(
                &fx.supervisor(),
                task_id,
                &InspectRoomTask {
                    outcome: InspectionOutcome::Pass,
                    note: None,
                    deficiency: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Only finished rooms can be inspected");
    }

    #[tokio::test]
    async fn unstarted_rooms_cannot_be_inspected() {
        let fx = Fixture::new().await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;
        let err = service
            .inspect(
                &fx.admin(),
                task_id,
                &InspectRoomTask {
                    outcome: InspectionOutcome::Pass,
                    note: None,
                    deficiency: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidState(_)));
    }

    #[tokio::test]
    async fn rejected_deficiency_leaves_the_room_uninspected() {
        let fx = Fixture::new().await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;
        let janitor = fx.janitor();
        service.start(&janitor, task_id).await.unwrap();
        service
            .flag_issues(&janitor, task_id, &FlagIssues { note: "Stained carpet".to_string() })
            .await
            .unwrap();

        let fail_with = |description: &str, assigned_to: Option<Uuid>| InspectRoomTask {
            outcome: InspectionOutcome::Fail,
            note: None,
            deficiency: Some(RaiseDeficiency {
                description: description.to_string(),
                severity: DeficiencySeverity::High,
                assigned_to,
            }),
        };

        let err = service
            .inspect(&fx.supervisor(), task_id, &fail_with("   ", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Description is required");

        let err = service
            .inspect(&fx.supervisor(), task_id, &fail_with("Shampoo carpet", Some(fx.client_user_id)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Assignee must be an active janitor");

        let view = service.view(&fx.supervisor(), task_id).await.unwrap();
        assert_eq!(view.task.status, RoomTaskStatus::HasIssues);
        assert!(view.task.inspected_by.is_none());
        assert!(view.deficiencies.is_empty());

        let result = service
            .inspect(&fx.supervisor(), task_id, &fail_with("Shampoo carpet", Some(fx.janitor_id)))
            .await
            .unwrap();
        assert_eq!(result.task.status, RoomTaskStatus::InspectedFail);
        let deficiency = result.deficiency.unwrap();
        assert_eq!(deficiency.description, "Shampoo carpet");
        assert_eq!(deficiency.assigned_to, Some(fx.janitor_id));
    }

    #[tokio::test]
    async fn replacing_a_photo_removes_the_old_object() {
        let fx = Fixture::new().await;
        let item = photo_checklist(&fx).await;
        let service = RoomTaskService::new(fx.pool());
        let task_id = running_task(&fx).await;
        let janitor = fx.janitor();
        service.start(&janitor, task_id).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let first = service
            .attach_photo(&janitor, &store, task_id, item.id, "image/jpeg", b"first", 1024)
            .await
            .unwrap()
            .photo_path
            .unwrap();
        let second = service
            .attach_photo(&janitor, &store, task_id, item.id, "image/png", b"second", 1024)
            .await
            .unwrap()
            .photo_path
            .unwrap();

        assert_ne!(first, second);
        assert!(matches!(store.get(&first).await, Err(StorageError::NotFound(_))));
        assert_eq!(store.get(&second).await.unwrap(), b"second");
    }
}

