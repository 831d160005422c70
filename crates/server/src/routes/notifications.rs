use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::notification::Notification;
use serde::Deserialize;
use services::services::notification::UnreadCount;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AnyMember, Authorized},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

/// GET /api/{org_slug}/notifications?unread=true&limit=20
pub async fn inbox(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
    Query(query): Query<InboxQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = state
        .notifications()
        .inbox(&scope, query.unread, query.limit)
        .await?;
    Ok(ResponseJson(ApiResponse::success(notifications)))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
) -> Result<ResponseJson<ApiResponse<UnreadCount>>, ApiError> {
    let count = state.notifications().unread_count(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(count)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
    Path((_, notification_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .notifications()
        .mark_read(&scope, notification_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/{org_slug}/notifications/read-all
/// Returns how many notifications were marked.
pub async fn mark_all_read(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
) -> Result<ResponseJson<ApiResponse<u64>>, ApiError> {
    let marked = state.notifications().mark_all_read(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(marked)))
}

/// Mounted under `/api/{org_slug}/notifications`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{notification_id}/read", post(mark_read))
}
