use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::{
    invitation::{CreateInvitation, Invitation},
    organisation::{Organisation, UpdateOrganisation},
    user::{Role, User},
};
use serde::Deserialize;
use services::services::users::{ChangeRole, IssuedInvitation, SetActive};
use utils::response::ApiResponse;
use uuid::Uuid;

use super::upload_content_type;
use crate::{
    AppState,
    auth::{AdminOnly, AnyMember, Authorized},
    error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
}

/// GET /api/{org_slug}/organisation
pub async fn get_organisation(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
) -> Result<ResponseJson<ApiResponse<Organisation>>, ApiError> {
    let organisation = state.organisations().get(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(organisation)))
}

/// PUT /api/{org_slug}/admin/organisation
pub async fn update_organisation(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<UpdateOrganisation>,
) -> Result<ResponseJson<ApiResponse<Organisation>>, ApiError> {
    let organisation = state.organisations().update_settings(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(organisation)))
}

/// PUT /api/{org_slug}/admin/organisation/logo
/// Raw image body; `Content-Type` selects the format.
pub async fn upload_logo(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<Organisation>>, ApiError> {
    let organisation = state
        .organisations()
        .upload_logo(
            &scope,
            state.storage.as_ref(),
            upload_content_type(&headers)?,
            &body,
            state.max_upload_bytes(),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(organisation)))
}

/// GET /api/{org_slug}/admin/users?role=janitor
pub async fn list_users(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Query(query): Query<UserQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.users().list(&scope, query.role).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn change_role(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, user_id)): Path<(String, Uuid)>,
    Json(payload): Json<ChangeRole>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = state.users().change_role(&scope, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn set_active(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, user_id)): Path<(String, Uuid)>,
    Json(payload): Json<SetActive>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = state.users().set_active(&scope, user_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// POST /api/{org_slug}/admin/invitations
pub async fn invite(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Json(payload): Json<CreateInvitation>,
) -> Result<ResponseJson<ApiResponse<IssuedInvitation>>, ApiError> {
    let issued = state.users().invite(&scope, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(issued)))
}

pub async fn pending_invitations(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
) -> Result<ResponseJson<ApiResponse<Vec<Invitation>>>, ApiError> {
    let invitations = state.users().pending_invitations(&scope).await?;
    Ok(ResponseJson(ApiResponse::success(invitations)))
}

pub async fn revoke_invitation(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AdminOnly>,
    Path((_, invitation_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.users().revoke_invitation(&scope, invitation_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Mounted under `/api/{org_slug}/admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/organisation", put(update_organisation))
        .route("/organisation/logo", put(upload_logo))
        .route("/users", get(list_users))
        .route("/users/{user_id}/role", put(change_role))
        .route("/users/{user_id}/active", put(set_active))
        .route("/invitations", post(invite).get(pending_invitations))
        .route("/invitations/{invitation_id}", delete(revoke_invitation))
}

/// Mounted under `/api/{org_slug}`.
pub fn member_router() -> Router<AppState> {
    Router::new().route("/organisation", get(get_organisation))
}
