//! Seeded in-memory organisation shared by the service tests.

use chrono::Duration;
use db::{
    DBService,
    models::{
        building::{Building, CreateBuilding},
        client::{Client, CreateClient},
        floor::{CreateFloor, Floor},
        organisation::{CreateOrganisation, Organisation},
        room::{CreateRoom, Room},
        room_type::RoomType,
        user::{CreateUser, Role, User},
    },
};
use sqlx::SqlitePool;
use utils::session::SessionCodec;
use uuid::Uuid;

use super::auth::{Scope, SessionClaims};

pub struct Fixture {
    pub db: DBService,
    pub codec: SessionCodec,
    pub org: Organisation,
    pub admin_id: Uuid,
    pub supervisor_id: Uuid,
    pub janitor_id: Uuid,
    pub client_user_id: Uuid,
    pub client_id: Uuid,
    pub building_id: Uuid,
    pub floor_id: Uuid,
    pub room_type_id: Uuid,
    /// Two active rooms on `floor_id`, both of type `room_type_id`.
    pub room_ids: Vec<Uuid>,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = DBService::in_memory().await.unwrap();
        let pool = &db.pool;
        let codec = SessionCodec::new("test-secret", Duration::hours(1)).unwrap();

        let org = Organisation::create(
            pool,
            &CreateOrganisation {
                name: "Acme Facilities".to_string(),
                slug: "acme".to_string(),
                pass_rate_threshold: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let client = Client::create(
            pool,
            org.id,
            &CreateClient {
                name: "Harbour Tower Ltd".to_string(),
                contact_email: Some("facilities@harbour.test".to_string()),
            },
        )
        .await
        .unwrap();

        let mut user_ids = Vec::new();
        for (email, role, client_id) in [
            ("admin@acme.test", Role::Admin, None),
            ("sup@acme.test", Role::Supervisor, None),
            ("jan@acme.test", Role::Janitor, None),
            ("client@harbour.test", Role::Client, Some(client.id)),
        ] {
            let user = User::create(
                pool,
                org.id,
                &CreateUser {
                    email: email.to_string(),
                    full_name: email.split('@').next().unwrap().to_string(),
                    role,
                    client_id,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
            user_ids.push(user.id);
        }

        let building = Building::create(
            pool,
            org.id,
            &CreateBuilding {
                client_id: client.id,
                name: "Harbour Tower".to_string(),
                address: None,
                floors: vec![],
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let floor = Floor::create(
            pool,
            org.id,
            building.id,
            &CreateFloor {
                name: "Ground".to_string(),
                level: 0,
            },
        )
        .await
        .unwrap();

        let room_type = RoomType::create(pool, org.id, "Office").await.unwrap();
        let mut room_ids = Vec::new();
        for name in ["G.01", "G.02"] {
            let room = Room::create(
                pool,
                org.id,
                &CreateRoom {
                    floor_id: floor.id,
                    room_type_id: Some(room_type.id),
                    name: name.to_string(),
                },
            )
            .await
            .unwrap();
            room_ids.push(room.id);
        }

        Self {
            codec,
            org,
            admin_id: user_ids[0],
            supervisor_id: user_ids[1],
            janitor_id: user_ids[2],
            client_user_id: user_ids[3],
            client_id: client.id,
            building_id: building.id,
            floor_id: floor.id,
            room_type_id: room_type.id,
            room_ids,
            db,
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.db.pool.clone()
    }

    pub fn claims(&self, user_id: Uuid, role: Role) -> SessionClaims {
        let client = (role == Role::Client).then_some(self.client_id);
        SessionClaims::new(&self.codec, user_id, self.org.id, role).with_client(client)
    }

    pub fn scope(&self, user_id: Uuid, role: Role) -> Scope {
        Scope {
            organisation: self.org.clone(),
            user_id,
            role,
            client_id: (role == Role::Client).then_some(self.client_id),
        }
    }

    pub fn admin(&self) -> Scope {
        self.scope(self.admin_id, Role::Admin)
    }

    pub fn supervisor(&self) -> Scope {
        self.scope(self.supervisor_id, Role::Supervisor)
    }

    pub fn janitor(&self) -> Scope {
        self.scope(self.janitor_id, Role::Janitor)
    }

    pub fn client(&self) -> Scope {
        self.scope(self.client_user_id, Role::Client)
    }
}
