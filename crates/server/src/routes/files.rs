use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use services::services::{error::ActionError, storage::key_belongs_to};
use tracing::debug;

use crate::{
    AppState,
    auth::{AnyMember, Authorized},
    error::ApiError,
};

/// GET /api/{org_slug}/files/{*key}
/// Streams a stored upload (photo, logo, floor plan) belonging to the organisation.
pub async fn get_file(
    State(state): State<AppState>,
    Authorized(scope, _): Authorized<AnyMember>,
    Path((_, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    if !key_belongs_to(&key, scope.org_id()) {
        debug!(key = %key, org_id = %scope.org_id(), "File key outside organisation");
        return Err(ActionError::Unauthorized.into());
    }
    let bytes = state.storage.get(&key).await?;
    let mime = mime_guess::from_path(&key).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}

/// Mounted under `/api/{org_slug}`.
pub fn router() -> Router<AppState> {
    Router::new().route("/files/{*key}", get(get_file))
}
