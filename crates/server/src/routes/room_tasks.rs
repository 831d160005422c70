use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    room_task::{RoomTask, RoomTaskDetail},
    task_item_response::{TaskItemResponse, UpsertTaskItemResponse},
};
use services::services::room_task::{FlagIssues, RoomTaskView};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::upload_content_type;
use crate::{
    AppState,
    auth::{Authorized, JanitorOnly, RoleSet},
    error::ApiError,
};

/// GET /api/{org_slug}/janitor/tasks
/// Rooms assigned to the caller in active activities.
pub async fn my_tasks(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
) -> Result<ResponseJson<ApiResponse<Vec<RoomTaskDetail>>>, ApiError> {
    let tasks = state.room_tasks().my_tasks(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

/// Room screen for one task. Janitors only see their own.
pub async fn view_task<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Path((_, task_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<RoomTaskView>>, ApiError> {
    let view = state.room_tasks().view(&scope, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Room screen reached from a QR scan.
pub async fn room_landing<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<RoomTaskView>>, ApiError> {
    let view = state
        .room_tasks()
        .open_task_for_room(&scope, room_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub async fn start_task(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
    Path((_, task_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<RoomTask>>, ApiError> {
    let task = state.room_tasks().start(&scope, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// PUT /api/{org_slug}/janitor/tasks/{task_id}/responses
pub async fn respond(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
    Path((_, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpsertTaskItemResponse>,
) -> Result<ResponseJson<ApiResponse<TaskItemResponse>>, ApiError> {
    let response = state
        .room_tasks()
        .respond(&scope, task_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// PUT /api/{org_slug}/janitor/tasks/{task_id}/items/{item_id}/photo
pub async fn attach_photo(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
    Path((_, task_id, item_id)): Path<(String, Uuid, Uuid)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<TaskItemResponse>>, ApiError> {
    let response = state
        .room_tasks()
        .attach_photo(
            &scope,
            state.storage.as_ref(),
            task_id,
            item_id,
            upload_content_type(&headers)?,
            &body,
            state.max_upload_bytes(),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

/// POST /api/{org_slug}/janitor/tasks/{task_id}/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
    Path((_, task_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<RoomTask>>, ApiError> {
    let task = state.room_tasks().complete(&scope, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn flag_issues(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<JanitorOnly>,
    Path((_, task_id)): Path<(String, Uuid)>,
    Json(payload): Json<FlagIssues>,
) -> Result<ResponseJson<ApiResponse<RoomTask>>, ApiError> {
    let task = state
        .room_tasks()
        .flag_issues(&scope, task_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// Mounted under `/api/{org_slug}/janitor`.
pub fn janitor_router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(my_tasks))
        .route("/tasks/{task_id}", get(view_task::<JanitorOnly>))
        .route("/tasks/{task_id}/start", post(start_task))
        .route("/tasks/{task_id}/responses", put(respond))
        .route("/tasks/{task_id}/items/{item_id}/photo", put(attach_photo))
        .route("/tasks/{task_id}/complete", post(complete_task))
        .route("/tasks/{task_id}/flag", post(flag_issues))
        .route("/rooms/{room_id}", get(room_landing::<JanitorOnly>))
}
