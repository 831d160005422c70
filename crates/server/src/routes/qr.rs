use axum::{
    Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use services::services::qr::scan_target;
use uuid::Uuid;

use crate::{AppState, auth::MaybeSession, error::ApiError};

/// GET /qr/rooms/{room_id}
/// Landing for a scanned room code: signed-in members go to their role's room page,
/// everyone else to sign-in with a return path.
pub async fn scan_room(
    State(state): State<AppState>,
    MaybeSession(claims): MaybeSession,
    Path(room_id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let target = scan_target(&state.db.pool, claims.as_ref(), room_id).await?;
    Ok(Redirect::to(&target))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/qr/rooms/{room_id}", get(scan_room))
}
