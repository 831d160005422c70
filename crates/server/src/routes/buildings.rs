use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    building::{Building, BuildingWithFloors, CreateBuilding, UpdateBuilding},
    client::{Client, CreateClient, UpdateClient},
    floor::{CreateFloor, Floor, UpdateFloor},
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use super::upload_content_type;
use crate::{
    AppState,
    auth::{AdminOnly, Authorized, Staff},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct BuildingQuery {
    pub client_id: Option<Uuid>,
}

/// GET /api/{org_slug}/admin/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
) -> Result<ResponseJson<ApiResponse<Vec<Client>>>, ApiError> {
    let clients = state.buildings().list_clients(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(clients)))
}

pub async fn create_client(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = state.buildings().create_client(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, client_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateClient>,
) -> Result<ResponseJson<ApiResponse<Client>>, ApiError> {
    let client = state
        .buildings()
        .update_client(&scope, client_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(client)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, client_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.buildings().delete_client(&scope, client_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/{org_slug}/supervisor/buildings?client_id=...
pub async fn list_buildings(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Query(query): Query<BuildingQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Building>>>, ApiError> {
    let buildings = state
        .buildings()
        .list_buildings(&scope, query.client_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(buildings)))
}

pub async fn get_building(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, building_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<BuildingWithFloors>>, ApiError> {
    let building = state.buildings().get_building(&scope, building_id).await?;
    Ok(ResponseJson(ApiResponse::success(building)))
}

/// POST /api/{org_slug}/admin/buildings
/// Creates the building together with its initial floors.
pub async fn create_building(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateBuilding>,
) -> Result<ResponseJson<ApiResponse<BuildingWithFloors>>, ApiError> {
    let building = state.buildings().create_building(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(building)))
}

pub async fn update_building(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, building_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateBuilding>,
) -> Result<ResponseJson<ApiResponse<Building>>, ApiError> {
    let building = state
        .buildings()
        .update_building(&scope, building_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(building)))
}

pub async fn delete_building(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, building_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.buildings().delete_building(&scope, building_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_floor(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, floor_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Floor>>, ApiError> {
    let floor = state.buildings().get_floor(&scope, floor_id).await?;
    Ok(ResponseJson(ApiResponse::success(floor)))
}

/// POST /api/{org_slug}/admin/buildings/{building_id}/floors
pub async fn add_floor(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, building_id)): Path<(String, Uuid)>,
    Json(payload): Json<CreateFloor>,
) -> Result<ResponseJson<ApiResponse<Floor>>, ApiError> {
    let floor = state
        .buildings()
        .add_floor(&scope, building_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(floor)))
}

pub async fn update_floor(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, floor_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateFloor>,
) -> Result<ResponseJson<ApiResponse<Floor>>, ApiError> {
    let floor = state
        .buildings()
        .update_floor(&scope, floor_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(floor)))
}

pub async fn delete_floor(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, floor_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.buildings().delete_floor(&scope, floor_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// PUT /api/{org_slug}/admin/floors/{floor_id}/plan
pub async fn upload_floor_plan(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, floor_id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<Floor>>, ApiError> {
    let floor = state
        .buildings()
        .upload_floor_plan(
            &scope,
            state.storage.as_ref(),
            floor_id,
            upload_content_type(&headers)?,
            &body,
            state.max_upload_bytes(),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(floor)))
}

/// Mounted under `/api/{org_slug}/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{client_id}",
            put(update_client).delete(delete_client),
        )
        .route("/buildings", get(list_buildings).post(create_building))
        .route(
            "/buildings/{building_id}",
            get(get_building)
                .put(update_building)
                .delete(delete_building),
        )
        .route("/buildings/{building_id}/floors", post(add_floor))
        .route(
            "/floors/{floor_id}",
            get(get_floor).put(update_floor).delete(delete_floor),
        )
        .route("/floors/{floor_id}/plan", put(upload_floor_plan))
}

/// Read-only structure for supervisors, mounted under `/api/{org_slug}/supervisor`.
pub fn staff_router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/buildings", get(list_buildings))
        .route("/buildings/{building_id}", get(get_building))
        .route("/floors/{floor_id}", get(get_floor))
}
