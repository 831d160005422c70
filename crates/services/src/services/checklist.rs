//! Checklist templates, their items, room overrides and completion gating.

use std::collections::{HashMap, HashSet};

use db::models::{
    checklist::{
        ChecklistItem, ChecklistTemplate, ChecklistTemplateWithItems, CreateChecklistItem,
        CreateChecklistTemplate, RoomChecklistOverride, UpdateChecklistItem,
        UpdateChecklistTemplate,
    },
    room::Room,
    room_type::RoomType,
    task_item_response::TaskItemResponse,
};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{
    auth::{ADMIN, ANY_ROLE, Scope},
    error::{ActionError, Found, StoreContext},
    validation::required_text,
};

/// Check every item of the effective checklist against the recorded responses.
/// Items are visited in position order and the first failure wins.
pub fn validate_completion(
    items: &[ChecklistItem],
    responses: &[TaskItemResponse],
) -> Result<(), ActionError> {
    let by_item: HashMap<Uuid, &TaskItemResponse> = responses
        .iter()
        .map(|response| (response.checklist_item_id, response))
        .collect();

    let mut ordered: Vec<&ChecklistItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.position);

    for item in ordered {
        let response = by_item.get(&item.id);
        if !response.is_some_and(|r| r.completed) {
            return Err(ActionError::invalid_state(format!(
                "Complete \"{}\" before finishing the room",
                item.label
            )));
        }
        if item.requires_photo && !response.is_some_and(|r| r.photo_path.is_some()) {
            return Err(ActionError::invalid_state(format!(
                "Add a photo for \"{}\" before finishing the room",
                item.label
            )));
        }
        let has_note = response
            .and_then(|r| r.note.as_deref())
            .is_some_and(|note| !note.trim().is_empty());
        if item.requires_note && !has_note {
            return Err(ActionError::invalid_state(format!(
                "Add a note for \"{}\" before finishing the room",
                item.label
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct ChecklistService {
    pool: SqlitePool,
}

impl ChecklistService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The template that applies to a room: its override, else the default for
    /// its room type, else none.
    pub async fn effective_template(
        &self,
        organisation_id: Uuid,
        room: &Room,
    ) -> Result<Option<ChecklistTemplate>, ActionError> {
        let overridden = RoomChecklistOverride::find_by_room(&self.pool, organisation_id, room.id)
            .await
            .store("Failed to load checklist")?;
        if let Some(room_override) = overridden {
            return ChecklistTemplate::find_by_id(&self.pool, organisation_id, room_override.template_id)
                .await
                .store("Failed to load checklist");
        }

        match room.room_type_id {
            Some(room_type_id) => {
                ChecklistTemplate::find_default_for_room_type(&self.pool, organisation_id, room_type_id)
                    .await
                    .store("Failed to load checklist")
            }
            None => Ok(None),
        }
    }

    /// Items of the effective checklist, empty when the room has none.
    pub async fn effective_items(
        &self,
        organisation_id: Uuid,
        room: &Room,
    ) -> Result<Vec<ChecklistItem>, ActionError> {
        match self.effective_template(organisation_id, room).await? {
            Some(template) => ChecklistItem::find_by_template(&self.pool, organisation_id, template.id)
                .await
                .store("Failed to load checklist"),
            None => Ok(Vec::new()),
        }
    }

    pub async fn effective_for_room(
        &self,
        scope: &Scope,
        room_id: Uuid,
    ) -> Result<Option<ChecklistTemplateWithItems>, ActionError> {
        scope.require(ANY_ROLE)?;
        let room = Room::find_by_id(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to load room")?
            .found("Room")?;
        match self.effective_template(scope.org_id(), &room).await? {
            Some(template) => Ok(Some(self.with_items(scope.org_id(), template).await?)),
            None => Ok(None),
        }
    }

    async fn with_items(
        &self,
        organisation_id: Uuid,
        template: ChecklistTemplate,
    ) -> Result<ChecklistTemplateWithItems, ActionError> {
        let items = ChecklistItem::find_by_template(&self.pool, organisation_id, template.id)
            .await
            .store("Failed to load checklist items")?;
        Ok(ChecklistTemplateWithItems { template, items })
    }

    async fn ensure_room_type(&self, organisation_id: Uuid, room_type_id: Option<Uuid>) -> Result<(), ActionError> {
        if let Some(room_type_id) = room_type_id {
            RoomType::find_by_id(&self.pool, organisation_id, room_type_id)
                .await
                .store("Failed to load room type")?
                .found("Room type")?;
        }
        Ok(())
    }

    pub async fn list_templates(&self, scope: &Scope) -> Result<Vec<ChecklistTemplate>, ActionError> {
        scope.require(ADMIN)?;
        ChecklistTemplate::find_by_organisation(&self.pool, scope.org_id())
            .await
            .store("Failed to load checklists")
    }

    pub async fn get_template(
        &self,
        scope: &Scope,
        template_id: Uuid,
    ) -> Result<ChecklistTemplateWithItems, ActionError> {
        scope.require(ADMIN)?;
        let template = ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        self.with_items(scope.org_id(), template).await
    }

    pub async fn create_template(
        &self,
        scope: &Scope,
        data: &CreateChecklistTemplate,
    ) -> Result<ChecklistTemplate, ActionError> {
        scope.require(ADMIN)?;
        let data = CreateChecklistTemplate {
            name: required_text("Name", &data.name, 120)?,
            room_type_id: data.room_type_id,
        };
        self.ensure_room_type(scope.org_id(), data.room_type_id).await?;

        let template = ChecklistTemplate::create(&self.pool, scope.org_id(), &data)
            .await
            .store_or_conflict(
                "Failed to create checklist",
                "A checklist with this name already exists",
            )?;
        info!(template_id = %template.id, org_id = %scope.org_id(), "Checklist created");
        Ok(template)
    }

    pub async fn update_template(
        &self,
        scope: &Scope,
        template_id: Uuid,
        data: &UpdateChecklistTemplate,
    ) -> Result<ChecklistTemplate, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateChecklistTemplate {
            name: required_text("Name", &data.name, 120)?,
            room_type_id: data.room_type_id,
        };
        self.ensure_room_type(scope.org_id(), data.room_type_id).await?;

        ChecklistTemplate::update(&self.pool, scope.org_id(), template_id, &data)
            .await
            .store_or_conflict(
                "Failed to update checklist",
                "A checklist with this name already exists",
            )?
            .found("Checklist")
    }

    pub async fn delete_template(&self, scope: &Scope, template_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = ChecklistTemplate::delete(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to delete checklist")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Checklist"));
        }
        info!(template_id = %template_id, "Checklist deleted");
        Ok(())
    }

    /// Make this template the default for its room type, replacing any previous
    /// default in the same transaction.
    pub async fn set_default(
        &self,
        scope: &Scope,
        template_id: Uuid,
    ) -> Result<ChecklistTemplate, ActionError> {
        scope.require(ADMIN)?;
        let template = ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        let Some(room_type_id) = template.room_type_id else {
            return Err(ActionError::validation(
                "Assign a room type before making this checklist the default",
            ));
        };

        let mut tx = self.pool.begin().await.store("Failed to set default checklist")?;
        ChecklistTemplate::clear_default_for_room_type(&mut *tx, scope.org_id(), room_type_id)
            .await
            .store("Failed to set default checklist")?;
        ChecklistTemplate::mark_default(&mut *tx, scope.org_id(), template_id)
            .await
            .store("Failed to set default checklist")?;
        tx.commit().await.store("Failed to set default checklist")?;

        info!(template_id = %template_id, room_type_id = %room_type_id, "Default checklist set");
        ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")
    }

    pub async fn clear_default(&self, scope: &Scope, template_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        ChecklistTemplate::unmark_default(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to clear default checklist")?;
        Ok(())
    }

    pub async fn add_item(
        &self,
        scope: &Scope,
        template_id: Uuid,
        data: &CreateChecklistItem,
    ) -> Result<ChecklistItem, ActionError> {
        scope.require(ADMIN)?;
        ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        let data = CreateChecklistItem {
            label: required_text("Label", &data.label, 200)?,
            requires_photo: data.requires_photo,
            requires_note: data.requires_note,
        };
        ChecklistItem::create(&self.pool, scope.org_id(), template_id, &data)
            .await
            .store("Failed to add checklist item")
    }

    pub async fn update_item(
        &self,
        scope: &Scope,
        item_id: Uuid,
        data: &UpdateChecklistItem,
    ) -> Result<ChecklistItem, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateChecklistItem {
            label: required_text("Label", &data.label, 200)?,
            requires_photo: data.requires_photo,
            requires_note: data.requires_note,
        };
        ChecklistItem::update(&self.pool, scope.org_id(), item_id, &data)
            .await
            .store("Failed to update checklist item")?
            .found("Checklist item")
    }

    pub async fn delete_item(&self, scope: &Scope, item_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = ChecklistItem::delete(&self.pool, scope.org_id(), item_id)
            .await
            .store("Failed to delete checklist item")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Checklist item"));
        }
        Ok(())
    }

    /// Rewrite item positions from the full ordered id list.
    pub async fn reorder_items(
        &self,
        scope: &Scope,
        template_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> Result<Vec<ChecklistItem>, ActionError> {
        scope.require(ADMIN)?;
        ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        let current = ChecklistItem::find_by_template(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist items")?;

        let expected: HashSet<Uuid> = current.iter().map(|item| item.id).collect();
        let given: HashSet<Uuid> = ordered_ids.iter().copied().collect();
        if given.len() != ordered_ids.len() || given != expected {
            return Err(ActionError::validation(
                "Reorder must list every checklist item exactly once",
            ));
        }

        let mut tx = self.pool.begin().await.store("Failed to reorder checklist")?;
        for (position, item_id) in ordered_ids.iter().enumerate() {
            ChecklistItem::set_position(&mut *tx, template_id, *item_id, position as i64)
                .await
                .store("Failed to reorder checklist")?;
        }
        tx.commit().await.store("Failed to reorder checklist")?;

        ChecklistItem::find_by_template(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist items")
    }

    pub async fn set_room_override(
        &self,
        scope: &Scope,
        room_id: Uuid,
        template_id: Uuid,
    ) -> Result<RoomChecklistOverride, ActionError> {
        scope.require(ADMIN)?;
        Room::find_by_id(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to load room")?
            .found("Room")?;
        ChecklistTemplate::find_by_id(&self.pool, scope.org_id(), template_id)
            .await
            .store("Failed to load checklist")?
            .found("Checklist")?;
        RoomChecklistOverride::upsert(&self.pool, scope.org_id(), room_id, template_id)
            .await
            .store("Failed to set room checklist")
    }

    pub async fn clear_room_override(&self, scope: &Scope, room_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        RoomChecklistOverride::delete(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to clear room checklist")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::services::test_support::Fixture;

    fn item(label: &str, position: i64, requires_photo: bool, requires_note: bool) -> ChecklistItem {
        ChecklistItem {
            id: Uuid::new_v4(),
            organisation_id: Uuid::nil(),
            template_id: Uuid::nil(),
            label: label.to_string(),
            position,
            requires_photo,
            requires_note,
            created_at: Utc::now(),
        }
    }

    fn response(item: &ChecklistItem, completed: bool, photo: bool, note: Option<&str>) -> TaskItemResponse {
        TaskItemResponse {
            id: Uuid::new_v4(),
            organisation_id: Uuid::nil(),
            room_task_id: Uuid::nil(),
            checklist_item_id: item.id,
            completed,
            photo_path: photo.then(|| "org/photos/x.jpg".to_string()),
            note: note.map(str::to_string),
            responded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_checklist_always_completes() {
        assert!(validate_completion(&[], &[]).is_ok());
    }

    #[test]
    fn first_failing_item_by_position_is_reported() {
        let bins = item("Empty bins", 1, false, false);
        let desk = item("Wipe desks", 0, false, false);
        let err = validate_completion(&[bins, desk], &[]).unwrap_err();
        assert_eq!(err.to_string(), "Complete \"Wipe desks\" before finishing the room");
    }

    #[test]
    fn missing_photo_and_note_are_specific() {
        let floor = item("Mop floor", 0, true, false);
        let err = validate_completion(&[floor.clone()], &[response(&floor, true, false, None)])
            .unwrap_err();
        assert_eq!(err.to_string(), "Add a photo for \"Mop floor\" before finishing the room");

        let supplies = item("Restock supplies", 0, false, true);
        let err = validate_completion(
            &[supplies.clone()],
            &[response(&supplies, true, false, Some("   "))],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Add a note for \"Restock supplies\" before finishing the room");

        assert!(
            validate_completion(
                &[floor.clone(), supplies.clone()],
                &[
                    response(&floor, true, true, None),
                    response(&supplies, true, false, Some("Soap low")),
                ],
            )
            .is_ok()
        );
    }

    #[tokio::test]
    async fn override_wins_over_room_type_default() {
        let fx = Fixture::new().await;
        let service = ChecklistService::new(fx.pool());
        let admin = fx.admin();

        let standard = service
            .create_template(
                &admin,
                &CreateChecklistTemplate {
                    name: "Office standard".to_string(),
                    room_type_id: Some(fx.room_type_id),
                },
            )
            .await
            .unwrap();
        service.set_default(&admin, standard.id).await.unwrap();

        let deep = service
            .create_template(
                &admin,
                &CreateChecklistTemplate {
                    name: "Deep clean".to_string(),
                    room_type_id: None,
                },
            )
            .await
            .unwrap();
        service
            .set_room_override(&admin, fx.room_ids[0], deep.id)
            .await
            .unwrap();

        let first = service.effective_for_room(&admin, fx.room_ids[0]).await.unwrap().unwrap();
        assert_eq!(first.template.id, deep.id);
        let second = service.effective_for_room(&admin, fx.room_ids[1]).await.unwrap().unwrap();
        assert_eq!(second.template.id, standard.id);

        service.clear_default(&admin, standard.id).await.unwrap();
        assert!(service.effective_for_room(&admin, fx.room_ids[1]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_default_replaces_previous_default() {
        let fx = Fixture::new().await;
        let service = ChecklistService::new(fx.pool());
        let admin = fx.admin();

        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let template = service
                .create_template(
                    &admin,
                    &CreateChecklistTemplate {
                        name: name.to_string(),
                        room_type_id: Some(fx.room_type_id),
                    },
                )
                .await
                .unwrap();
            ids.push(template.id);
        }
        service.set_default(&admin, ids[0]).await.unwrap();
        let b = service.set_default(&admin, ids[1]).await.unwrap();
        assert!(b.is_default);

        let a = service.get_template(&admin, ids[0]).await.unwrap();
        assert!(!a.template.is_default);
    }

    #[tokio::test]
    async fn reorder_rewrites_positions() {
        let fx = Fixture::new().await;
        let service = ChecklistService::new(fx.pool());
        let admin = fx.admin();
        let template = service
            .create_template(
                &admin,
                &CreateChecklistTemplate {
                    name: "Kitchen".to_string(),
                    room_type_id: None,
                },
            )
            .await
            .unwrap();

        let mut ids = Vec::new();
        for label in ["Sink", "Counters", "Floor"] {
            let item = service
                .add_item(
                    &admin,
                    template.id,
                    &CreateChecklistItem {
                        label: label.to_string(),
                        requires_photo: false,
                        requires_note: false,
                    },
                )
                .await
                .unwrap();
            ids.push(item.id);
        }

        let reordered = service
            .reorder_items(&admin, template.id, &[ids[2], ids[0], ids[1]])
            .await
            .unwrap();
        let labels: Vec<_> = reordered.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Floor", "Sink", "Counters"]);

        let err = service
            .reorder_items(&admin, template.id, &[ids[0], ids[1]])
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
    }

    #[tokio::test]
    async fn janitors_cannot_edit_checklists() {
        let fx = Fixture::new().await;
        let service = ChecklistService::new(fx.pool());
        let err = service.list_templates(&fx.janitor()).await.unwrap_err();
        assert!(matches!(err, ActionError::Unauthorized));
    }
}
