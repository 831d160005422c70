use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::deficiency::{
    CreateDeficiency, Deficiency, DeficiencyStatus, ResolveDeficiency,
};
use serde::Deserialize;
use services::services::deficiency::AssignDeficiency;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::{Authorized, JanitorOnly, RoleSet, Staff},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct DeficiencyQuery {
    pub status: Option<DeficiencyStatus>,
}

/// GET /api/{org_slug}/{segment}/deficiencies?status=open
/// Staff see every deficiency; janitors only those assigned to them.
pub async fn list_deficiencies<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Query(query): Query<DeficiencyQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Deficiency>>>, ApiError> {
    let deficiencies = state.deficiencies().list(&scope, query.status).await?;
    Ok(ResponseJson(ApiResponse::success(deficiencies)))
}

pub async fn get_deficiency<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Path((_, deficiency_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Deficiency>>, ApiError> {
    let deficiency = state.deficiencies().get(&scope, deficiency_id).await?;
    Ok(ResponseJson(ApiResponse::success(deficiency)))
}

/// POST /api/{org_slug}/supervisor/deficiencies
pub async fn create_deficiency(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Json(payload): Json<CreateDeficiency>,
) -> Result<ResponseJson<ApiResponse<Deficiency>>, ApiError> {
    let deficiency = state.deficiencies().create(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(deficiency)))
}

pub async fn assign_deficiency(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<Staff>,
    Path((_, deficiency_id)): Path<(String, Uuid)>,
    Json(payload): Json<AssignDeficiency>,
) -> Result<ResponseJson<ApiResponse<Deficiency>>, ApiError> {
    let deficiency = state
        .deficiencies()
        .assign(&scope, deficiency_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(deficiency)))
}

pub async fn start_deficiency<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Path((_, deficiency_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Deficiency>>, ApiError> {
    let deficiency = state.deficiencies().start(&scope, deficiency_id).await?;
    Ok(ResponseJson(ApiResponse::success(deficiency)))
}

/// POST /api/{org_slug}/{segment}/deficiencies/{deficiency_id}/resolve
pub async fn resolve_deficiency<R: RoleSet>(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<R>,
    Path((_, deficiency_id)): Path<(String, Uuid)>,
    Json(payload): Json<ResolveDeficiency>,
) -> Result<ResponseJson<ApiResponse<Deficiency>>, ApiError> {
    let deficiency = state
        .deficiencies()
        .resolve(&scope, deficiency_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(deficiency)))
}

/// Mounted under `/api/{org_slug}/supervisor`.
pub fn staff_router() -> Router<AppState> {
    Router::new()
        .route(
            "/deficiencies",
            get(list_deficiencies::<Staff>).post(create_deficiency),
        )
        .route(
            "/deficiencies/{deficiency_id}",
            get(get_deficiency::<Staff>),
        )
        .route(
            "/deficiencies/{deficiency_id}/assignee",
            put(assign_deficiency),
        )
        .route(
            "/deficiencies/{deficiency_id}/start",
            post(start_deficiency::<Staff>),
        )
        .route(
            "/deficiencies/{deficiency_id}/resolve",
            post(resolve_deficiency::<Staff>),
        )
}

/// Mounted under `/api/{org_slug}/janitor`.
pub fn janitor_router() -> Router<AppState> {
    Router::new()
        .route("/deficiencies", get(list_deficiencies::<JanitorOnly>))
        .route(
            "/deficiencies/{deficiency_id}",
            get(get_deficiency::<JanitorOnly>),
        )
        .route(
            "/deficiencies/{deficiency_id}/start",
            post(start_deficiency::<JanitorOnly>),
        )
        .route(
            "/deficiencies/{deficiency_id}/resolve",
            post(resolve_deficiency::<JanitorOnly>),
        )
}
