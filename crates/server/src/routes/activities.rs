use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::{
    activity_template::{ActivityTemplate, CreateActivityTemplate},
    cleaning_activity::{
        ActivityStatus, ActivitySummary, CleaningActivity, CreateCleaningActivity,
        UpdateCleaningActivity,
    },
    room_task::RoomTask,
    user::{Role, User},
};
use serde::Deserialize;
use services::services::{
    activity::{ActivityDetail, AssignRoomTask},
    activity_template::TemplateFromActivity,
    report::ActivityReport,
    room_task::{InspectRoomTask, InspectionResult},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::room_tasks::{room_landing, view_task};
use crate::{
    AppState,
    auth::{Authorized, Staff},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub status: Option<ActivityStatus>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub floor_id: Option<Uuid>,
}

/// GET /api/{org_slug}/supervisor/activities?status=active&client_id=...
pub async fn list_activities(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Query(query): Query<ActivityQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivitySummary>>>, ApiError> {
    let activities = state
        .activities()
        .list(&scope, query.status, query.client_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(activities)))
}

pub async fn get_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ActivityDetail>>, ApiError> {
    let activity = state.activities().get(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

/// POST /api/{org_slug}/supervisor/activities
/// Creates a draft activity with one room task per active room on the floor.
pub async fn create_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Json(payload): Json<CreateCleaningActivity>,
) -> Result<ResponseJson<ApiResponse<ActivityDetail>>, ApiError> {
    let activity = state.activities().create(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

pub async fn update_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateCleaningActivity>,
) -> Result<ResponseJson<ApiResponse<CleaningActivity>>, ApiError> {
    let activity = state
        .activities()
        .update(&scope, activity_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

pub async fn delete_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.activities().delete(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/{org_slug}/supervisor/activities/{activity_id}/publish
pub async fn publish_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<CleaningActivity>>, ApiError> {
    let activity = state.activities().publish(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

pub async fn close_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<CleaningActivity>>, ApiError> {
    let activity = state.activities().close(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

pub async fn cancel_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<CleaningActivity>>, ApiError> {
    let activity = state.activities().cancel(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(activity)))
}

/// GET /api/{org_slug}/supervisor/activities/{activity_id}/report
pub async fn activity_report(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, activity_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ActivityReport>>, ApiError> {
    let report = state.reports().activity_report(&scope, activity_id).await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

/// PUT /api/{org_slug}/supervisor/room-tasks/{task_id}/assignee
pub async fn assign_task(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<AssignRoomTask>,
) -> Result<ResponseJson<ApiResponse<RoomTask>>, ApiError> {
    let task = state
        .activities()
        .assign_task(&scope, task_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// POST /api/{org_slug}/supervisor/room-tasks/{task_id}/inspect
pub async fn inspect_task(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<InspectRoomTask>,
) -> Result<ResponseJson<ApiResponse<InspectionResult>>, ApiError> {
    let result = state.room_tasks().inspect(&scope, task_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// GET /api/{org_slug}/supervisor/janitors
pub async fn list_janitors(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let janitors = state.users().list(&scope, Some(Role::Janitor)).await?;
    Ok(ResponseJson(ApiResponse::success(janitors)))
}

pub async fn list_templates(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Query(query): Query<TemplateQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityTemplate>>>, ApiError> {
    let templates = state
        .activity_templates()
        .list(&scope, query.floor_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn create_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Json(payload): Json<CreateActivityTemplate>,
) -> Result<ResponseJson<ApiResponse<ActivityTemplate>>, ApiError> {
    let template = state.activity_templates().create(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

/// POST /api/{org_slug}/supervisor/activity-templates/from-activity
pub async fn template_from_activity(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Json(payload): Json<TemplateFromActivity>,
) -> Result<ResponseJson<ApiResponse<ActivityTemplate>>, ApiError> {
    let template = state
        .activity_templates()
        .create_from_activity(&scope, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.activity_templates().delete(&scope, template_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Mounted under `/api/{org_slug}/supervisor`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/{activity_id}",
            get(get_activity)
                .put(update_activity)
                .delete(delete_activity),
        )
        .route("/activities/{activity_id}/publish", post(publish_activity))
        .route("/activities/{activity_id}/close", post(close_activity))
        .route("/activities/{activity_id}/cancel", post(cancel_activity))
        .route("/activities/{activity_id}/report", get(activity_report))
        .route("/room-tasks/{task_id}", get(view_task::<Staff>))
        .route("/room-tasks/{task_id}/assignee", put(assign_task))
        .route("/room-tasks/{task_id}/inspect", post(inspect_task))
        .route("/rooms/{room_id}", get(room_landing::<Staff>))
        .route("/janitors", get(list_janitors))
        .route(
            "/activity-templates",
            get(list_templates).post(create_template),
        )
        .route(
            "/activity-templates/from-activity",
            post(template_from_activity),
        )
        .route("/activity-templates/{template_id}", delete(delete_template))
}
