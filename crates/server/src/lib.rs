use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use chrono::Duration;
use db::DBService;
use services::services::{
    activity::ActivityService, activity_template::ActivityTemplateService,
    buildings::BuildingService, checklist::ChecklistService, deficiency::DeficiencyService,
    notification::NotificationService, organisation::OrganisationService, report::ReportService,
    room_task::RoomTaskService, rooms::RoomService,
    storage::{LocalObjectStore, ObjectStore},
    users::UserService,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utils::session::SessionCodec;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use config::Config;

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub storage: Arc<dyn ObjectStore>,
    pub codec: SessionCodec,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let db = DBService::new(&config.database_url).await?;
        let storage: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(config.storage_root.clone()));
        Self::new(db, storage, config)
    }

    pub fn new(db: DBService, storage: Arc<dyn ObjectStore>, config: Config) -> anyhow::Result<Self> {
        let codec = SessionCodec::new(&config.session_secret, Duration::hours(config.session_ttl_hours))?;
        Ok(Self {
            db,
            storage,
            codec,
            config: Arc::new(config),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    pub fn activities(&self) -> ActivityService {
        ActivityService::new(self.db.pool.clone())
    }

    pub fn activity_templates(&self) -> ActivityTemplateService {
        ActivityTemplateService::new(self.db.pool.clone())
    }

    pub fn buildings(&self) -> BuildingService {
        BuildingService::new(self.db.pool.clone())
    }

    pub fn checklists(&self) -> ChecklistService {
        ChecklistService::new(self.db.pool.clone())
    }

    pub fn deficiencies(&self) -> DeficiencyService {
        DeficiencyService::new(self.db.pool.clone())
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.db.pool.clone())
    }

    pub fn organisations(&self) -> OrganisationService {
        OrganisationService::new(self.db.pool.clone())
    }

    pub fn reports(&self) -> ReportService {
        ReportService::new(self.db.pool.clone())
    }

    pub fn room_tasks(&self) -> RoomTaskService {
        RoomTaskService::new(self.db.pool.clone())
    }

    pub fn rooms(&self) -> RoomService {
        RoomService::new(self.db.pool.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::with_invitation_ttl(
            self.db.pool.clone(),
            Duration::hours(self.config.invitation_ttl_hours),
        )
    }
}

pub fn build_router(state: AppState) -> Router {
    // Uploads arrive as raw bodies; the per-kind guard enforces the configured size.
    let body_limit = state.max_upload_bytes().saturating_add(64 * 1024);
    routes::router()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
