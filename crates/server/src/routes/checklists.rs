use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::checklist::{
    ChecklistItem, ChecklistTemplate, ChecklistTemplateWithItems, CreateChecklistItem,
    CreateChecklistTemplate, RoomChecklistOverride, UpdateChecklistItem, UpdateChecklistTemplate,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AdminOnly, AnyMember, Authorized},
    error::ApiError,
};

/// Full new ordering of a checklist's items.
#[derive(Debug, Deserialize, TS)]
pub struct ReorderItems {
    pub item_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, TS)]
pub struct SetRoomChecklist {
    pub template_id: Uuid,
}

/// GET /api/{org_slug}/admin/checklists
pub async fn list_templates(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
) -> Result<ResponseJson<ApiResponse<Vec<ChecklistTemplate>>>, ApiError> {
    let templates = state.checklists().list_templates(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn get_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ChecklistTemplateWithItems>>, ApiError> {
    let template = state.checklists().get_template(&scope, template_id).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn create_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateChecklistTemplate>,
) -> Result<ResponseJson<ApiResponse<ChecklistTemplate>>, ApiError> {
    let template = state.checklists().create_template(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateChecklistTemplate>,
) -> Result<ResponseJson<ApiResponse<ChecklistTemplate>>, ApiError> {
    let template = state
        .checklists()
        .update_template(&scope, template_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.checklists().delete_template(&scope, template_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// PUT /api/{org_slug}/admin/checklists/{template_id}/default
/// Makes this checklist the default for its room type, replacing any previous default.
pub async fn set_default(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ChecklistTemplate>>, ApiError> {
    let template = state.checklists().set_default(&scope, template_id).await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn clear_default(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.checklists().clear_default(&scope, template_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn add_item(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
    Json(payload): Json<CreateChecklistItem>,
) -> Result<ResponseJson<ApiResponse<ChecklistItem>>, ApiError> {
    let item = state
        .checklists()
        .add_item(&scope, template_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn update_item(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, item_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateChecklistItem>,
) -> Result<ResponseJson<ApiResponse<ChecklistItem>>, ApiError> {
    let item = state
        .checklists()
        .update_item(&scope, item_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, item_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.checklists().delete_item(&scope, item_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// PUT /api/{org_slug}/admin/checklists/{template_id}/items/order
pub async fn reorder_items(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, template_id)): Path<(String, Uuid)>,
    Json(payload): Json<ReorderItems>,
) -> Result<ResponseJson<ApiResponse<Vec<ChecklistItem>>>, ApiError> {
    let items = state
        .checklists()
        .reorder_items(&scope, template_id, &payload.item_ids)
        .await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

/// PUT /api/{org_slug}/admin/rooms/{room_id}/checklist
pub async fn set_room_override(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_id)): Path<(String, Uuid)>,
    Json(payload): Json<SetRoomChecklist>,
) -> Result<ResponseJson<ApiResponse<RoomChecklistOverride>>, ApiError> {
    let room_override = state
        .checklists()
        .set_room_override(&scope, room_id, payload.template_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(room_override)))
}

pub async fn clear_room_override(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.checklists().clear_room_override(&scope, room_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/{org_slug}/rooms/{room_id}/checklist
/// The checklist that applies to the room: its override, else its room type's default.
pub async fn effective_for_room(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Option<ChecklistTemplateWithItems>>>, ApiError> {
    let checklist = state.checklists().effective_for_room(&scope, room_id).await?;
    Ok(ResponseJson(ApiResponse::success(checklist)))
}

/// Mounted under `/api/{org_slug}/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/checklists", get(list_templates).post(create_template))
        .route(
            "/checklists/{template_id}",
            get(get_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route(
            "/checklists/{template_id}/default",
            put(set_default).delete(clear_default),
        )
        .route("/checklists/{template_id}/items", post(add_item))
        .route("/checklists/{template_id}/items/order", put(reorder_items))
        .route(
            "/checklist-items/{item_id}",
            put(update_item).delete(delete_item),
        )
        .route(
            "/rooms/{room_id}/checklist",
            put(set_room_override).delete(clear_room_override),
        )
}

/// Mounted under `/api/{org_slug}`.
pub fn member_router() -> Router<AppState> {
    Router::new().route("/rooms/{room_id}/checklist", get(effective_for_room))
}
