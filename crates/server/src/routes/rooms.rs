use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    room::{CreateRoom, Room, UpdateRoom},
    room_type::{CreateRoomType, RoomType},
};
use serde::Serialize;
use services::services::qr;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AdminOnly, AnyMember, Authorized, Staff},
    error::ApiError,
};

/// Printable QR target for a room.
#[derive(Debug, Clone, Serialize, TS)]
pub struct RoomQrCode {
    pub room_id: Uuid,
    pub url: String,
}

pub async fn list_room_types(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
) -> Result<ResponseJson<ApiResponse<Vec<RoomType>>>, ApiError> {
    let room_types = state.rooms().list_room_types(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(room_types)))
}

pub async fn create_room_type(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateRoomType>,
) -> Result<ResponseJson<ApiResponse<RoomType>>, ApiError> {
    let room_type = state.rooms().create_room_type(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(room_type)))
}

pub async fn rename_room_type(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_type_id)): Path<(String, Uuid)>,
    Json(payload): Json<CreateRoomType>,
) -> Result<ResponseJson<ApiResponse<RoomType>>, ApiError> {
    let room_type = state
        .rooms()
        .rename_room_type(&scope, room_type_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(room_type)))
}

pub async fn delete_room_type(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_type_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.rooms().delete_room_type(&scope, room_type_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/{org_slug}/supervisor/floors/{floor_id}/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, floor_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Vec<Room>>>, ApiError> {
    let rooms = state.rooms().list_rooms(&scope, floor_id).await?;
    Ok(ResponseJson(ApiResponse::success(rooms)))
}

/// GET /api/{org_slug}/rooms/{room_id}
pub async fn get_room(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Room>>, ApiError> {
    let room = state.rooms().get_room(&scope, room_id).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn create_room(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateRoom>,
) -> Result<ResponseJson<ApiResponse<Room>>, ApiError> {
    let room = state.rooms().create_room(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn update_room(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateRoom>,
) -> Result<ResponseJson<ApiResponse<Room>>, ApiError> {
    let room = state.rooms().update_room(&scope, room_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(room)))
}

pub async fn delete_room(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.rooms().delete_room(&scope, room_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/{org_slug}/admin/rooms/{room_id}/qr
pub async fn room_qr_code(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, room_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<RoomQrCode>>, ApiError> {
    let room = state.rooms().get_room(&scope, room_id).await?;
    let url = qr::landing_url(&state.config.public_base_url, room.id);
    Ok(ResponseJson(ApiResponse::success(RoomQrCode {
        room_id: room.id,
        url,
    })))
}

/// Mounted under `/api/{org_slug}/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/room-types", get(list_room_types).post(create_room_type))
        .route(
            "/room-types/{room_type_id}",
            put(rename_room_type).delete(delete_room_type),
        )
        .route("/floors/{floor_id}/rooms", get(list_rooms))
        .route("/rooms", post(create_room))
        .route(
            "/rooms/{room_id}",
            get(get_room).put(update_room).delete(delete_room),
        )
        .route("/rooms/{room_id}/qr", get(room_qr_code))
}

/// Mounted under `/api/{org_slug}/supervisor`.
pub fn staff_router() -> Router<AppState> {
    Router::new()
        .route("/room-types", get(list_room_types))
        .route("/floors/{floor_id}/rooms", get(list_rooms))
}

/// Mounted under `/api/{org_slug}`; any member may look up a room.
pub fn member_router() -> Router<AppState> {
    Router::new().route("/rooms/{room_id}", get(get_room))
}
