use axum::{
    Router,
    http::{HeaderMap, header::CONTENT_TYPE},
    routing::get,
};

use crate::{AppState, error::ApiError};

pub mod activities;
pub mod buildings;
pub mod checklists;
pub mod deficiencies;
pub mod files;
pub mod health;
pub mod invitations;
pub mod notifications;
pub mod organisation;
pub mod qr;
pub mod reports;
pub mod room_tasks;
pub mod rooms;

/// Uploads are sent as a raw body typed by `Content-Type`.
pub(crate) fn upload_content_type(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or(value).trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Content-Type header is required".to_string()))
}

fn organisation_router() -> Router<AppState> {
    let admin = Router::new()
        .merge(organisation::admin_router())
        .merge(buildings::admin_router())
        .merge(rooms::admin_router())
        .merge(checklists::admin_router());

    let supervisor = Router::new()
        .merge(activities::router())
        .merge(deficiencies::staff_router())
        .merge(buildings::staff_router())
        .merge(rooms::staff_router());

    let janitor = Router::new()
        .merge(room_tasks::janitor_router())
        .merge(deficiencies::janitor_router());

    Router::new()
        .nest("/admin", admin)
        .nest("/supervisor", supervisor)
        .nest("/janitor", janitor)
        .nest("/client", reports::client_router())
        .nest("/notifications", notifications::router())
        .merge(organisation::member_router())
        .merge(rooms::member_router())
        .merge(checklists::member_router())
        .merge(files::router())
}

pub fn router() -> Router<AppState> {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .merge(invitations::router())
        .nest("/{org_slug}", organisation_router());

    Router::new().nest("/api", api).merge(qr::router())
}
