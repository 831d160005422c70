use db::models::{
    floor::Floor,
    room::{CreateRoom, Room, UpdateRoom},
    room_type::{CreateRoomType, RoomType},
};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{
    auth::{ADMIN, ANY_ROLE, STAFF, Scope},
    error::{ActionError, Found, StoreContext},
    validation::required_text,
};

#[derive(Clone)]
pub struct RoomService {
    pool: SqlitePool,
}

impl RoomService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_room_types(&self, scope: &Scope) -> Result<Vec<RoomType>, ActionError> {
        scope.require(STAFF)?;
        RoomType::find_by_organisation(&self.pool, scope.org_id())
            .await
            .store("Failed to load room types")
    }

    pub async fn create_room_type(
        &self,
        scope: &Scope,
        data: &CreateRoomType,
    ) -> Result<RoomType, ActionError> {
        scope.require(ADMIN)?;
        let name = required_text("Name", &data.name, 80)?;
        RoomType::create(&self.pool, scope.org_id(), &name)
            .await
            .store_or_conflict("Failed to create room type", "A room type with this name already exists")
    }

    pub async fn rename_room_type(
        &self,
        scope: &Scope,
        room_type_id: Uuid,
        data: &CreateRoomType,
    ) -> Result<RoomType, ActionError> {
        scope.require(ADMIN)?;
        let name = required_text("Name", &data.name, 80)?;
        RoomType::rename(&self.pool, scope.org_id(), room_type_id, &name)
            .await
            .store_or_conflict("Failed to rename room type", "A room type with this name already exists")?
            .found("Room type")
    }

    /// Rooms of this type become untyped.
    pub async fn delete_room_type(&self, scope: &Scope, room_type_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = RoomType::delete(&self.pool, scope.org_id(), room_type_id)
            .await
            .store("Failed to delete room type")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Room type"));
        }
        Ok(())
    }

    pub async fn list_rooms(&self, scope: &Scope, floor_id: Uuid) -> Result<Vec<Room>, ActionError> {
        scope.require(STAFF)?;
        Floor::find_by_id(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")?;
        Room::find_by_floor(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to load rooms")
    }

    pub async fn get_room(&self, scope: &Scope, room_id: Uuid) -> Result<Room, ActionError> {
        scope.require(ANY_ROLE)?;
        Room::find_by_id(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to load room")?
            .found("Room")
    }

    async fn ensure_room_type(&self, scope: &Scope, room_type_id: Option<Uuid>) -> Result<(), ActionError> {
        if let Some(room_type_id) = room_type_id {
            RoomType::find_by_id(&self.pool, scope.org_id(), room_type_id)
                .await
                .store("Failed to load room type")?
                .found("Room type")?;
        }
        Ok(())
    }

    pub async fn create_room(&self, scope: &Scope, data: &CreateRoom) -> Result<Room, ActionError> {
        scope.require(ADMIN)?;
        let data = CreateRoom {
            floor_id: data.floor_id,
            room_type_id: data.room_type_id,
            name: required_text("Name", &data.name, 80)?,
        };
        Floor::find_by_id(&self.pool, scope.org_id(), data.floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")?;
        self.ensure_room_type(scope, data.room_type_id).await?;

        let room = Room::create(&self.pool, scope.org_id(), &data)
            .await
            .store_or_conflict("Failed to create room", "A room with this name already exists on the floor")?;
        info!(room_id = %room.id, floor_id = %room.floor_id, "Room created");
        Ok(room)
    }

    /// Also used to deactivate a room; inactive rooms get no tasks in new activities.
    pub async fn update_room(
        &self,
        scope: &Scope,
        room_id: Uuid,
        data: &UpdateRoom,
    ) -> Result<Room, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateRoom {
            room_type_id: data.room_type_id,
            name: required_text("Name", &data.name, 80)?,
            is_active: data.is_active,
        };
        self.ensure_room_type(scope, data.room_type_id).await?;
        Room::update(&self.pool, scope.org_id(), room_id, &data)
            .await
            .store_or_conflict("Failed to update room", "A room with this name already exists on the floor")?
            .found("Room")
    }

    pub async fn delete_room(&self, scope: &Scope, room_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = Room::delete(&self.pool, scope.org_id(), room_id)
            .await
            .store("Failed to delete room")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Room"));
        }
        info!(room_id = %room_id, "Room deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;

    #[tokio::test]
    async fn room_names_are_unique_per_floor() {
        let fx = Fixture::new().await;
        let service = RoomService::new(fx.pool());
        let err = service
            .create_room(
                &fx.admin(),
                &CreateRoom {
                    floor_id: fx.floor_id,
                    room_type_id: None,
                    name: "G.01".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Conflict(_)));
    }

    #[tokio::test]
    async fn rooms_can_be_deactivated() {
        let fx = Fixture::new().await;
        let service = RoomService::new(fx.pool());
        let room = service
            .update_room(
                &fx.admin(),
                fx.room_ids[0],
                &UpdateRoom {
                    room_type_id: Some(fx.room_type_id),
                    name: "G.01".to_string(),
                    is_active: false,
                },
            )
            .await
            .unwrap();
        assert!(!room.is_active);
    }

    #[tokio::test]
    async fn rooms_in_other_organisations_are_not_found() {
        let fx = Fixture::new().await;
        let other = Fixture::new().await;
        let service = RoomService::new(fx.pool());
        let err = service.get_room(&fx.admin(), other.room_ids[0]).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound("Room")));
    }

    #[tokio::test]
    async fn deleting_a_room_type_keeps_rooms() {
        let fx = Fixture::new().await;
        let service = RoomService::new(fx.pool());
        service.delete_room_type(&fx.admin(), fx.room_type_id).await.unwrap();
        let room = service.get_room(&fx.admin(), fx.room_ids[0]).await.unwrap();
        assert!(room.room_type_id.is_none());
    }
}
