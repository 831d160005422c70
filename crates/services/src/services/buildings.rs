//! Clients, buildings and floors.

use std::collections::HashSet;

use db::models::{
    building::{Building, BuildingWithFloors, CreateBuilding, NewFloor, UpdateBuilding},
    client::{Client, CreateClient, UpdateClient},
    floor::{CreateFloor, Floor, UpdateFloor},
};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    auth::{ADMIN, STAFF, Scope},
    error::{ActionError, Found, StoreContext},
    storage::{ObjectStore, UploadKind, store_upload},
    validation::{optional_email, optional_text, required_text},
};

const FLOOR_LEVEL_TAKEN: &str = "A floor with this level already exists in the building";

#[derive(Clone)]
pub struct BuildingService {
    pool: SqlitePool,
}

impl BuildingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_clients(&self, scope: &Scope) -> Result<Vec<Client>, ActionError> {
        scope.require(STAFF)?;
        Client::find_by_organisation(&self.pool, scope.org_id())
            .await
            .store("Failed to load clients")
    }

    pub async fn create_client(
        &self,
        scope: &Scope,
        data: &CreateClient,
    ) -> Result<Client, ActionError> {
        scope.require(ADMIN)?;
        let data = CreateClient {
            name: required_text("Name", &data.name, 120)?,
            contact_email: optional_email(data.contact_email.as_deref())?,
        };
        let client = Client::create(&self.pool, scope.org_id(), &data)
            .await
            .store_or_conflict("Failed to create client", "A client with this name already exists")?;
        info!(client_id = %client.id, org_id = %scope.org_id(), "Client created");
        Ok(client)
    }

    pub async fn update_client(
        &self,
        scope: &Scope,
        client_id: Uuid,
        data: &UpdateClient,
    ) -> Result<Client, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateClient {
            name: required_text("Name", &data.name, 120)?,
            contact_email: optional_email(data.contact_email.as_deref())?,
            is_active: data.is_active,
        };
        Client::update(&self.pool, scope.org_id(), client_id, &data)
            .await
            .store_or_conflict("Failed to update client", "A client with this name already exists")?
            .found("Client")
    }

    pub async fn delete_client(&self, scope: &Scope, client_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = Client::delete(&self.pool, scope.org_id(), client_id)
            .await
            .store("Failed to delete client")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Client"));
        }
        info!(client_id = %client_id, "Client deleted");
        Ok(())
    }

    pub async fn list_buildings(
        &self,
        scope: &Scope,
        client_id: Option<Uuid>,
    ) -> Result<Vec<Building>, ActionError> {
        scope.require(STAFF)?;
        Building::find_by_organisation(&self.pool, scope.org_id(), client_id)
            .await
            .store("Failed to load buildings")
    }

    pub async fn get_building(
        &self,
        scope: &Scope,
        building_id: Uuid,
    ) -> Result<BuildingWithFloors, ActionError> {
        scope.require(STAFF)?;
        let building = Building::find_by_id(&self.pool, scope.org_id(), building_id)
            .await
            .store("Failed to load building")?
            .found("Building")?;
        let floors = Floor::find_by_building(&self.pool, scope.org_id(), building.id)
            .await
            .store("Failed to load floors")?;
        Ok(BuildingWithFloors { building, floors })
    }

    /// Insert the building and its floors atomically.
    pub async fn create_building(
        &self,
        scope: &Scope,
        data: &CreateBuilding,
    ) -> Result<BuildingWithFloors, ActionError> {
        scope.require(ADMIN)?;
        let mut floors = Vec::with_capacity(data.floors.len());
        let mut levels = HashSet::new();
        for floor in &data.floors {
            if !levels.insert(floor.level) {
                return Err(ActionError::validation(format!(
                    "Floor level {} is listed more than once",
                    floor.level
                )));
            }
            floors.push(NewFloor {
                name: required_text("Floor name", &floor.name, 120)?,
                level: floor.level,
            });
        }
        let data = CreateBuilding {
            client_id: data.client_id,
            name: required_text("Name", &data.name, 120)?,
            address: optional_text("Address", data.address.as_deref(), 300)?,
            floors,
        };
        Client::find_by_id(&self.pool, scope.org_id(), data.client_id)
            .await
            .store("Failed to load client")?
            .found("Client")?;

        let mut tx = self.pool.begin().await.store("Failed to create building")?;
        let building = Building::create(&mut *tx, scope.org_id(), &data, Uuid::new_v4())
            .await
            .store_or_conflict(
                "Failed to create building",
                "A building with this name already exists for the client",
            )?;
        let mut created = Vec::with_capacity(data.floors.len());
        for floor in &data.floors {
            let floor = Floor::create(
                &mut *tx,
                scope.org_id(),
                building.id,
                &CreateFloor {
                    name: floor.name.clone(),
                    level: floor.level,
                },
            )
            .await
            .store_or_conflict("Failed to create building", FLOOR_LEVEL_TAKEN)?;
            created.push(floor);
        }
        tx.commit().await.store("Failed to create building")?;

        info!(
            building_id = %building.id,
            floors = created.len(),
            org_id = %scope.org_id(),
            "Building created"
        );
        Ok(BuildingWithFloors {
            building,
            floors: created,
        })
    }

    pub async fn update_building(
        &self,
        scope: &Scope,
        building_id: Uuid,
        data: &UpdateBuilding,
    ) -> Result<Building, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateBuilding {
            name: required_text("Name", &data.name, 120)?,
            address: optional_text("Address", data.address.as_deref(), 300)?,
        };
        Building::update(&self.pool, scope.org_id(), building_id, &data)
            .await
            .store_or_conflict(
                "Failed to update building",
                "A building with this name already exists for the client",
            )?
            .found("Building")
    }

    /// Floors, rooms and activities go with the building.
    pub async fn delete_building(&self, scope: &Scope, building_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = Building::delete(&self.pool, scope.org_id(), building_id)
            .await
            .store("Failed to delete building")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Building"));
        }
        info!(building_id = %building_id, "Building deleted");
        Ok(())
    }

    pub async fn get_floor(&self, scope: &Scope, floor_id: Uuid) -> Result<Floor, ActionError> {
        scope.require(STAFF)?;
        Floor::find_by_id(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")
    }

    pub async fn add_floor(
        &self,
        scope: &Scope,
        building_id: Uuid,
        data: &CreateFloor,
    ) -> Result<Floor, ActionError> {
        scope.require(ADMIN)?;
        Building::find_by_id(&self.pool, scope.org_id(), building_id)
            .await
            .store("Failed to load building")?
            .found("Building")?;
        let data = CreateFloor {
            name: required_text("Name", &data.name, 120)?,
            level: data.level,
        };
        Floor::create(&self.pool, scope.org_id(), building_id, &data)
            .await
            .store_or_conflict("Failed to add floor", FLOOR_LEVEL_TAKEN)
    }

    pub async fn update_floor(
        &self,
        scope: &Scope,
        floor_id: Uuid,
        data: &UpdateFloor,
    ) -> Result<Floor, ActionError> {
        scope.require(ADMIN)?;
        let data = UpdateFloor {
            name: required_text("Name", &data.name, 120)?,
            level: data.level,
        };
        Floor::update(&self.pool, scope.org_id(), floor_id, &data)
            .await
            .store_or_conflict("Failed to update floor", FLOOR_LEVEL_TAKEN)?
            .found("Floor")
    }

    pub async fn delete_floor(&self, scope: &Scope, floor_id: Uuid) -> Result<(), ActionError> {
        scope.require(ADMIN)?;
        let deleted = Floor::delete(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to delete floor")?;
        if deleted == 0 {
            return Err(ActionError::NotFound("Floor"));
        }
        Ok(())
    }

    pub async fn upload_floor_plan(
        &self,
        scope: &Scope,
        store: &dyn ObjectStore,
        floor_id: Uuid,
        content_type: &str,
        bytes: &[u8],
        max_bytes: usize,
    ) -> Result<Floor, ActionError> {
        scope.require(ADMIN)?;
        let floor = Floor::find_by_id(&self.pool, scope.org_id(), floor_id)
            .await
            .store("Failed to load floor")?
            .found("Floor")?;

        let key = store_upload(
            store,
            UploadKind::FloorPlan,
            (scope.org_id(), "floors", floor.id),
            content_type,
            bytes,
            max_bytes,
        )
        .await?;
        let updated = Floor::set_floor_plan_path(&self.pool, scope.org_id(), floor.id, &key)
            .await
            .store("Failed to save floor plan")?
            .found("Floor")?;

        if let Some(previous) = floor.floor_plan_path {
            if let Err(e) = store.delete(&previous).await {
                warn!(error = %e, key = %previous, "Failed to remove replaced floor plan");
            }
        }
        Ok(updated)
    }
}
