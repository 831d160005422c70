//! Deficiencies raised against room tasks, and their resolution.

use db::models::{
    deficiency::{CreateDeficiency, Deficiency, DeficiencyStatus, ResolveDeficiency},
    room_task::RoomTask,
    user::{Role, User},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    auth::{ANY_ROLE, STAFF, Scope},
    error::{ActionError, Found, StoreContext},
    notification::NotificationService,
    validation::{optional_text, required_text},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct AssignDeficiency {
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct DeficiencyService {
    pool: SqlitePool,
    notifications: NotificationService,
}

impl DeficiencyService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            notifications: NotificationService::new(pool.clone()),
            pool,
        }
    }

    async fn load(&self, scope: &Scope, deficiency_id: Uuid) -> Result<Deficiency, ActionError> {
        Deficiency::find_by_id(&self.pool, scope.org_id(), deficiency_id)
            .await
            .store("Failed to load deficiency")?
            .found("Deficiency")
    }

    /// Staff see every deficiency; janitors only those assigned to them.
    fn ensure_visible(scope: &Scope, deficiency: &Deficiency) -> Result<(), ActionError> {
        if scope.is_staff() || (scope.is(Role::Janitor) && deficiency.assigned_to == Some(scope.user_id)) {
            Ok(())
        } else {
            Err(ActionError::Unauthorized)
        }
    }

    async fn ensure_janitor(&self, scope: &Scope, user_id: Uuid) -> Result<(), ActionError> {
        User::find_active_janitor(&self.pool, scope.org_id(), user_id)
            .await
            .store("Failed to load janitor")?
            .ok_or_else(|| ActionError::validation("Assignee must be an active janitor"))?;
        Ok(())
    }

    pub(crate) async fn notify_assignee(&self, scope: &Scope, deficiency: &Deficiency) {
        if let Some(assignee) = deficiency.assigned_to {
            let link = format!(
                "/{}/{}/deficiencies/{}",
                scope.organisation.slug,
                Role::Janitor.segment(),
                deficiency.id
            );
            self.notifications
                .notify(
                    scope.org_id(),
                    assignee,
                    "Deficiency assigned to you",
                    &deficiency.description,
                    Some(&link),
                )
                .await;
        }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        status: Option<DeficiencyStatus>,
    ) -> Result<Vec<Deficiency>, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor, Role::Janitor])?;
        let assigned_to = (!scope.is_staff()).then_some(scope.user_id);
        Deficiency::find_by_organisation(&self.pool, scope.org_id(), status, assigned_to)
            .await
            .store("Failed to load deficiencies")
    }

    pub async fn get(&self, scope: &Scope, deficiency_id: Uuid) -> Result<Deficiency, ActionError> {
        scope.require(ANY_ROLE)?;
        let deficiency = self.load(scope, deficiency_id).await?;
        Self::ensure_visible(scope, &deficiency)?;
        Ok(deficiency)
    }

    /// Trimmed copy of `data` once the description and assignee are acceptable.
    pub(crate) async fn checked(
        &self,
        scope: &Scope,
        data: &CreateDeficiency,
    ) -> Result<CreateDeficiency, ActionError> {
        let description = required_text("Description", &data.description, 2000)?;
        if let Some(user_id) = data.assigned_to {
            self.ensure_janitor(scope, user_id).await?;
        }
        Ok(CreateDeficiency {
            room_task_id: data.room_task_id,
            description,
            severity: data.severity,
            assigned_to: data.assigned_to,
        })
    }

    pub async fn create(
        &self,
        scope: &Scope,
        data: &CreateDeficiency,
    ) -> Result<Deficiency, ActionError> {
        scope.require(STAFF)?;
        let data = self.checked(scope, data).await?;
        RoomTask::find_by_id(&self.pool, scope.org_id(), data.room_task_id)
            .await
            .store("Failed to load room task")?
            .found("Room task")?;

        let deficiency = Deficiency::create(&self.pool, scope.org_id(), &data, scope.user_id)
            .await
            .store("Failed to create deficiency")?;
        info!(
            deficiency_id = %deficiency.id,
            room_task_id = %deficiency.room_task_id,
            severity = %deficiency.severity,
            "Deficiency raised"
        );
        self.notify_assignee(scope, &deficiency).await;
        Ok(deficiency)
    }

    pub async fn assign(
        &self,
        scope: &Scope,
        deficiency_id: Uuid,
        data: &AssignDeficiency,
    ) -> Result<Deficiency, ActionError> {
        scope.require(STAFF)?;
        self.load(scope, deficiency_id).await?;
        self.ensure_janitor(scope, data.user_id).await?;

        let deficiency = Deficiency::assign(&self.pool, scope.org_id(), deficiency_id, data.user_id)
            .await
            .store("Failed to assign deficiency")?
            .ok_or_else(|| ActionError::invalid_state("Deficiency is already resolved"))?;
        info!(deficiency_id = %deficiency.id, assignee = %data.user_id, "Deficiency assigned");
        self.notify_assignee(scope, &deficiency).await;
        Ok(deficiency)
    }

    pub async fn start(&self, scope: &Scope, deficiency_id: Uuid) -> Result<Deficiency, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor, Role::Janitor])?;
        let deficiency = self.load(scope, deficiency_id).await?;
        Self::ensure_visible(scope, &deficiency)?;

        Deficiency::start(&self.pool, scope.org_id(), deficiency_id)
            .await
            .store("Failed to start deficiency")?
            .ok_or_else(|| ActionError::invalid_state("Only open deficiencies can be started"))
    }

    /// `open | in_progress -> resolved`, exactly once.
    pub async fn resolve(
        &self,
        scope: &Scope,
        deficiency_id: Uuid,
        data: &ResolveDeficiency,
    ) -> Result<Deficiency, ActionError> {
        scope.require(&[Role::Admin, Role::Supervisor, Role::Janitor])?;
        let note = optional_text("Resolution note", data.resolution_note.as_deref(), 2000)?;
        let deficiency = self.load(scope, deficiency_id).await?;
        Self::ensure_visible(scope, &deficiency)?;

        let resolved = Deficiency::resolve(
            &self.pool,
            scope.org_id(),
            deficiency_id,
            scope.user_id,
            note.as_deref(),
        )
        .await
        .store("Failed to resolve deficiency")?
        .ok_or_else(|| ActionError::invalid_state("Deficiency is already resolved"))?;
        info!(deficiency_id = %resolved.id, resolved_by = %scope.user_id, "Deficiency resolved");

        if let Some(creator) = resolved.created_by.filter(|creator| *creator != scope.user_id) {
            let link = format!(
                "/{}/{}/deficiencies/{}",
                scope.organisation.slug,
                Role::Supervisor.segment(),
                resolved.id
            );
            self.notifications
                .notify(
                    scope.org_id(),
                    creator,
                    "Deficiency resolved",
                    &resolved.description,
                    Some(&link),
                )
                .await;
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use db::models::{
        cleaning_activity::CreateCleaningActivity, deficiency::DeficiencySeverity,
        notification::Notification,
    };

    use super::*;
    use crate::services::{activity::ActivityService, test_support::Fixture};

    async fn task_id(fx: &Fixture) -> Uuid {
        let detail = ActivityService::new(fx.pool())
            .create(
                &fx.supervisor(),
                &CreateCleaningActivity {
                    floor_id: fx.floor_id,
                    name: "Weekly".to_string(),
                    scheduled_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                    window_start: None,
                    window_end: None,
                    notes: None,
                    template_id: None,
                },
            )
            .await
            .unwrap();
        detail.tasks[0].task.id
    }

    fn raise(room_task_id: Uuid, assigned_to: Option<Uuid>) -> CreateDeficiency {
        CreateDeficiency {
            room_task_id,
            description: "Carpet stain by the window".to_string(),
            severity: DeficiencySeverity::High,
            assigned_to,
        }
    }

    #[tokio::test]
    async fn resolving_happens_exactly_once() {
        let fx = Fixture::new().await;
        let service = DeficiencyService::new(fx.pool());
        let task = task_id(&fx).await;
        let deficiency = service
            .create(&fx.supervisor(), &raise(task, Some(fx.janitor_id)))
            .await
            .unwrap();
        assert_eq!(deficiency.status, DeficiencyStatus::Open);

        let started = service.start(&fx.janitor(), deficiency.id).await.unwrap();
        assert_eq!(started.status, DeficiencyStatus::InProgress);

        let resolved = service
            .resolve(
                &fx.janitor(),
                deficiency.id,
                &ResolveDeficiency {
                    resolution_note: Some("Shampooed".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(resolved.status, DeficiencyStatus::Resolved);
        assert_eq!(resolved.resolved_by, Some(fx.janitor_id));
        assert!(resolved.resolved_at.is_some());

        let err = service
            .resolve(
                &fx.supervisor(),
                deficiency.id,
                &ResolveDeficiency {
                    resolution_note: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Deficiency is already resolved");
        let unchanged = service.get(&fx.supervisor(), deficiency.id).await.unwrap();
        assert_eq!(unchanged.resolved_by, Some(fx.janitor_id));
    }

    #[tokio::test]
    async fn assignment_and_resolution_notify() {
        let fx = Fixture::new().await;
        let service = DeficiencyService::new(fx.pool());
        let task = task_id(&fx).await;
        let deficiency = service.create(&fx.supervisor(), &raise(task, None)).await.unwrap();

        service
            .assign(&fx.supervisor(), deficiency.id, &AssignDeficiency { user_id: fx.janitor_id })
            .await
            .unwrap();
        let janitor_inbox = Notification::find_for_user(&fx.pool(), fx.org.id, fx.janitor_id, true, 10)
            .await
            .unwrap();
        assert_eq!(janitor_inbox.len(), 1);
        assert!(janitor_inbox[0].link.as_deref().unwrap().starts_with("/acme/janitor/deficiencies/"));

        service
            .resolve(&fx.janitor(), deficiency.id, &ResolveDeficiency { resolution_note: None })
            .await
            .unwrap();
        let creator_inbox =
            Notification::find_for_user(&fx.pool(), fx.org.id, fx.supervisor_id, true, 10)
                .await
                .unwrap();
        assert_eq!(creator_inbox.len(), 1);
        assert_eq!(creator_inbox[0].title, "Deficiency resolved");
    }

    #[tokio::test]
    async fn creator_resolving_gets_no_notification() {
        let fx = Fixture::new().await;
        let service = DeficiencyService::new(fx.pool());
        let task = task_id(&fx).await;
        let deficiency = service.create(&fx.supervisor(), &raise(task, None)).await.unwrap();
        service
            .resolve(&fx.supervisor(), deficiency.id, &ResolveDeficiency { resolution_note: None })
            .await
            .unwrap();
        let inbox = Notification::find_for_user(&fx.pool(), fx.org.id, fx.supervisor_id, false, 10)
            .await
            .unwrap();
        assert!(inbox.is_empty());
    }

    #[tokio::test]
    async fn janitors_only_touch_their_own_deficiencies() {
        let fx = Fixture::new().await;
        let service = DeficiencyService::new(fx.pool());
        let task = task_id(&fx).await;
        let deficiency = service.create(&fx.supervisor(), &raise(task, None)).await.unwrap();

        assert!(service.list(&fx.janitor(), None).await.unwrap().is_empty());
        let err = service.start(&fx.janitor(), deficiency.id).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
        let err = service.create(&fx.janitor(), &raise(task, None)).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }
}
